//! Library layer for the S&P 1500 dataset tools.
//!
//! Builds the company universe from the index constituent pages plus Yahoo
//! metadata, and enriches a company table with historical price snapshots
//! fetched through the `massive_api` client.

pub mod anchors;
pub mod config;
pub mod enrich;
pub mod error;
pub mod metadata;
pub mod retry;
pub mod selector;
pub mod snapshot;
pub mod table;
pub mod universe;
pub mod validation;

pub use massive_api;

pub use anchors::{output_columns, snapshot_columns, Anchor, SnapshotField, ERROR_COLUMN};
pub use config::{MassiveConfig, UniverseConfig};
pub use enrich::{run_snapshot_jobs, DEFAULT_WORKERS};
pub use error::Sp1500Error;
pub use metadata::{CompanyInfo, MetadataClient, MetadataError};
pub use retry::{with_retry, RetryPolicy, Retryable};
pub use snapshot::{run_snapshot_job, BarSource, JobError, MassiveBarSource, SnapshotRow};
pub use table::{normalize_symbol, MergeStats, Table, TableError};
pub use universe::{build_universe, IndexScraper, IndexTable, ScrapeError, UniverseStats};
