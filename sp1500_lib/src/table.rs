//! Flat CSV company table: read, column resolution, snapshot merge, write.
//!
//! Cells are kept as strings; an empty cell is a null. The table is the
//! authoritative row set: merging never adds or removes rows.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::anchors::output_columns;
use crate::snapshot::SnapshotRow;

#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("symbol column '{column}' not found. Columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Case-folded, trimmed form used as the join key.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Counts reported by [`Table::merge_snapshots`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Rows that received a result.
    pub matched: usize,
    /// Rows with no result; their snapshot columns were nulled.
    pub cleared: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Parse CSV with a header row. Header names are trimmed and stripped of
    /// a UTF-8 BOM; short rows are padded with nulls.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        }

        // Rows longer than the header get synthetic column names.
        let width = rows.iter().map(|r| r.len()).fold(headers.len(), usize::max);
        let mut headers = headers;
        while headers.len() < width {
            headers.push(format!("column_{}", headers.len()));
        }
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Ok(Self { headers, rows })
    }

    pub fn read_path(path: &Path) -> Result<Self, TableError> {
        if !path.exists() {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        Self::from_reader(File::open(path)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write to a sibling temp file, then rename over `path`.
    pub fn write_path(&self, path: &Path) -> Result<(), TableError> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let file = File::create(&tmp)?;
            self.write_to(file)?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Exact header match, falling back to a case-insensitive one.
    pub fn resolve_column(&self, name: &str) -> Result<String, TableError> {
        if self.column_index(name).is_some() {
            return Ok(name.to_string());
        }
        let lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|h| h.to_lowercase() == lower)
            .cloned()
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    /// Index of `name`, appending an all-null column if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn ensure_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.ensure_column(name.as_ref());
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Append a row given as `(column, value)` pairs, adding unknown columns.
    pub fn push_record(&mut self, record: &[(String, String)]) {
        for (name, _) in record {
            self.ensure_column(name);
        }
        let mut row = vec![String::new(); self.headers.len()];
        for (name, value) in record {
            if let Some(idx) = self.column_index(name) {
                row[idx] = value.clone();
            }
        }
        self.rows.push(row);
    }

    /// Distinct normalized symbols from `column`, first-seen order, blanks skipped.
    pub fn unique_symbols(&self, column: &str) -> Result<Vec<String>, TableError> {
        let idx = self.column_index(column).ok_or_else(|| TableError::MissingColumn {
            column: column.to_string(),
            available: self.headers.clone(),
        })?;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let symbol = normalize_symbol(&row[idx]);
            if !symbol.is_empty() && seen.insert(symbol.clone()) {
                out.push(symbol);
            }
        }
        Ok(out)
    }

    /// Left-join snapshot results onto the table by normalized symbol.
    ///
    /// Every row gets all 43 output columns overwritten: with its result when
    /// one exists, otherwise with nulls, so no stale values from an earlier
    /// run survive. Other columns are untouched.
    pub fn merge_snapshots(
        &mut self,
        symbol_column: &str,
        results: &HashMap<String, SnapshotRow>,
    ) -> Result<MergeStats, TableError> {
        let sym_idx = self
            .column_index(symbol_column)
            .ok_or_else(|| TableError::MissingColumn {
                column: symbol_column.to_string(),
                available: self.headers.clone(),
            })?;
        let columns = output_columns();
        self.ensure_columns(&columns);
        let col_idx: Vec<usize> = columns
            .iter()
            .map(|c| self.column_index(c).unwrap_or_default())
            .collect();

        let mut stats = MergeStats::default();
        for row in &mut self.rows {
            match results.get(&normalize_symbol(&row[sym_idx])) {
                Some(result) => {
                    for ((_, value), idx) in result.cells().into_iter().zip(&col_idx) {
                        row[*idx] = value.unwrap_or_default();
                    }
                    stats.matched += 1;
                }
                None => {
                    for idx in &col_idx {
                        row[*idx].clear();
                    }
                    stats.cleared += 1;
                }
            }
        }
        Ok(stats)
    }
}
