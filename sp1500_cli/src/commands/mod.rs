//! CLI subcommand implementations.

pub mod snapshots;
pub mod universe;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub(crate) fn progress_bar(len: usize, message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
    )?);
    pb.set_message(message);
    Ok(pb)
}
