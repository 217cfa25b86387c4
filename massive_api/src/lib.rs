mod client;
mod errors;
mod query;
mod status;
pub mod types;
pub use self::client::{Client, DEFAULT_BASE_URL};
pub use self::errors::Error;
pub use self::query::{AggsQuery, SortOrder, Timespan};
pub use self::status::{classify, Classification};
