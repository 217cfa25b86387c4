mod aggs;
pub use self::aggs::{AggsResponse, Bar};
