use chrono::NaiveDate;

use crate::error::Sp1500Error;

/// Upper bound on concurrent snapshot jobs.
pub const MAX_WORKERS: usize = 256;

/// Validate a YYYY-MM-DD date string.
pub fn validate_date(input: &str) -> Result<NaiveDate, Sp1500Error> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        Sp1500Error::InvalidInput(format!(
            "invalid date '{}'. Expected format: YYYY-MM-DD (e.g., 2025-06-30)",
            trimmed
        ))
    })
}

/// Validate the worker pool width: must be 1..=MAX_WORKERS.
pub fn validate_workers(workers: usize) -> Result<usize, Sp1500Error> {
    if !(1..=MAX_WORKERS).contains(&workers) {
        return Err(Sp1500Error::InvalidInput(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, workers
        )));
    }
    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_valid() {
        assert_eq!(
            validate_date("2025-06-30").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
        );
    }

    #[test]
    fn date_trims_whitespace() {
        assert!(validate_date(" 2024-02-29 ").is_ok());
    }

    #[test]
    fn date_invalid() {
        assert!(validate_date("2025-13-01").is_err());
        assert!(validate_date("2023-02-29").is_err());
        assert!(validate_date("06/30/2025").is_err());
        assert!(validate_date("").is_err());
    }

    #[test]
    fn workers_bounds() {
        assert!(validate_workers(0).is_err());
        assert_eq!(validate_workers(1).unwrap(), 1);
        assert_eq!(validate_workers(20).unwrap(), 20);
        assert_eq!(validate_workers(MAX_WORKERS).unwrap(), MAX_WORKERS);
        assert!(validate_workers(MAX_WORKERS + 1).is_err());
    }
}
