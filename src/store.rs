use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::records::{DataKind, Record};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("Could not read {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub fn path(data_dir: &Path, kind: DataKind) -> PathBuf {
    data_dir.join(kind.file_name())
}

// ── Writing ──

/// Write `rows` to `{data_dir}/{kind}.csv`, replacing any previous file.
/// The header is written even when `rows` is empty.
pub fn write_records<R: Record>(data_dir: &Path, rows: &[R]) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {:?}", data_dir))?;
    let p = path(data_dir, R::KIND);

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&p)
        .with_context(|| format!("Failed to open {:?}", p))?;
    wtr.write_record(R::COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!(file = %p.display(), rows = rows.len(), "wrote {}", R::KIND);
    Ok(p)
}

// ── Reading ──

/// A loosely typed CSV file: whatever header it has, and rows padded or cut
/// to the header width. Lookups by column name return `None` for columns the
/// file doesn't have.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// First of `names` the table has.
    pub fn column_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.column(n))
    }

    pub fn records(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }
}

#[derive(Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Trimmed non-empty cell under `name`.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let idx = self.table.column(name)?;
        self.at(idx)
    }

    pub fn get_any(&self, names: &[&str]) -> Option<&'a str> {
        let idx = self.table.column_any(names)?;
        self.at(idx)
    }

    pub fn at(&self, idx: usize) -> Option<&'a str> {
        self.cells
            .get(idx)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

pub fn read_table(p: &Path) -> Result<Table, StoreError> {
    if !p.exists() {
        return Err(StoreError::Missing(p.to_path_buf()));
    }
    let malformed = |source| StoreError::Malformed {
        path: p.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(p)
        .map_err(malformed)?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let width = headers.len();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(malformed)?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(width, String::new());
        rows.push(cells);
    }

    Ok(Table { headers, rows })
}

pub fn load(data_dir: &Path, kind: DataKind) -> Result<Table, StoreError> {
    read_table(&path(data_dir, kind))
}
