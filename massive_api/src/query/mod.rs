mod aggs;
pub use self::aggs::{AggsQuery, SortOrder, Timespan};
