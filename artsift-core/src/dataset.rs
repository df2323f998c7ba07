//! Tabular dataset passed through the pipeline.
//!
//! Artwork dumps arrive as CSV with free-form metadata columns, so cells
//! are kept as raw strings and an empty cell counts as null. The pipeline
//! never mutates a caller's table: every shape-changing operation returns
//! a fresh `Dataset`.

use crate::error::{ArtsiftError, DatasetError};
use std::io::{Read, Write};
use std::path::Path;

/// A header plus string rows. Row length always equals header length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset from parts, rejecting rows that do not match the
    /// header width.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(DatasetError::RaggedRow {
                    row: i,
                    found: row.len(),
                    expected: header.len(),
                });
            }
        }
        Ok(Self { header, rows })
    }

    /// Read a headered CSV stream. All cells are kept as strings.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ArtsiftError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let header = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { header, rows })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, ArtsiftError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ArtsiftError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.header)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<(), ArtsiftError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }

    pub fn header(&self) -> &[String] {
        &self.header
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

    /// Index of a column the pipeline requires. A missing column is a
    /// caller contract violation, not a per-item runtime condition.
    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// New dataset keeping only rows for which `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&[String]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| keep(row))
            .cloned()
            .collect();
        Dataset {
            header: self.header.clone(),
            rows,
        }
    }

    /// New dataset with `column` set per-row from `value`. The column is
    /// appended if the header does not already carry it; `value` always
    /// sees the row before the write.
    pub fn with_column<F>(&self, column: &str, mut value: F) -> Dataset
    where
        F: FnMut(&[String]) -> String,
    {
        match self.header.iter().position(|h| h == column) {
            Some(idx) => {
                let rows = self
                    .rows
                    .iter()
                    .map(|row| {
                        let cell = value(row);
                        let mut row = row.clone();
                        row[idx] = cell;
                        row
                    })
                    .collect();
                Dataset {
                    header: self.header.clone(),
                    rows,
                }
            }
            None => {
                let mut header = self.header.clone();
                header.push(column.to_string());
                let rows = self
                    .rows
                    .iter()
                    .map(|row| {
                        let cell = value(row);
                        let mut row = row.clone();
                        row.push(cell);
                        row
                    })
                    .collect();
                Dataset { header, rows }
            }
        }
    }
}
