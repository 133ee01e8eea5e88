//! CSV table I/O with atomic replacement.
//!
//! Tables keep every cell as the text found on disk, so a rewrite only changes the
//! cells a caller touched.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use keeper_core::{KeeperError, KeeperResult};

/// A header row plus string rows, each tagged with its 1-based line in the source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub line: Option<u64>,
    pub cells: Vec<String>,
}

impl CsvTable {
    pub fn with_headers(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Read a table; `Ok(None)` when the file does not exist
    pub fn read(path: &Path) -> KeeperResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| csv_open_error(path, e))?;

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(headers.len().max(cells.len()), String::new());
            rows.push(TableRow {
                line: record.position().map(|p| p.line()),
                cells,
            });
        }

        Ok(Some(Self { headers, rows }))
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Index of a column, appending it (filled via `fill`) when absent.
    ///
    /// Blank cells in an existing column are filled too.
    pub fn ensure_column(&mut self, name: &str, mut fill: impl FnMut(&TableRow) -> String) -> usize {
        let idx = match self.column(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        for row in &mut self.rows {
            if row.cells.len() <= idx {
                row.cells.resize(idx + 1, String::new());
            }
            if row.cells[idx].trim().is_empty() {
                let value = fill(row);
                row.cells[idx] = value;
            }
        }
        idx
    }

    /// Move a column to the front (used to put ids first after a migration)
    pub fn move_column_first(&mut self, idx: usize) {
        if idx == 0 || idx >= self.headers.len() {
            return;
        }
        let header = self.headers.remove(idx);
        self.headers.insert(0, header);
        for row in &mut self.rows {
            let cell = if idx < row.cells.len() {
                row.cells.remove(idx)
            } else {
                String::new()
            };
            row.cells.insert(0, cell);
        }
    }

    /// Write the whole table to a scratch file next to `path`, then rename it into place
    pub fn write_atomic(&self, path: &Path) -> KeeperResult<()> {
        ensure_parent(path)?;
        let temp_path = scratch_path(path);

        let result = (|| -> KeeperResult<()> {
            let file = File::create(&temp_path).map_err(|e| KeeperError::io(&temp_path, e))?;
            let mut wtr = csv::Writer::from_writer(file);
            wtr.write_record(&self.headers)?;
            for row in &self.rows {
                let mut cells = row.cells.clone();
                cells.resize(self.headers.len(), String::new());
                wtr.write_record(&cells)?;
            }
            wtr.flush().map_err(|e| KeeperError::io(&temp_path, e))?;
            let file = wtr.into_inner().map_err(|e| {
                KeeperError::io(&temp_path, std::io::Error::new(e.error().kind(), e.error().to_string()))
            })?;
            file.sync_all().map_err(|e| KeeperError::io(&temp_path, e))?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            KeeperError::io(path, e)
        })
    }
}

/// Append records to a CSV file, writing `headers` first when the file is new or empty
pub fn append_records(path: &Path, headers: &[String], records: &[Vec<String>]) -> KeeperResult<()> {
    ensure_parent(path)?;
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    if !needs_header {
        ensure_trailing_newline(path)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| KeeperError::io(path, e))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    if needs_header {
        wtr.write_record(headers)?;
    }
    for record in records {
        wtr.write_record(record)?;
    }
    wtr.flush().map_err(|e| KeeperError::io(path, e))?;
    Ok(())
}

fn ensure_trailing_newline(path: &Path) -> KeeperResult<()> {
    let bytes = fs::read(path).map_err(|e| KeeperError::io(path, e))?;
    if bytes.last().is_some_and(|b| *b != b'\n') {
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| KeeperError::io(path, e))?;
        file.write_all(b"\n").map_err(|e| KeeperError::io(path, e))?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> KeeperResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| KeeperError::io(parent, e))?;
        }
    }
    Ok(())
}

fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn csv_open_error(path: &Path, e: csv::Error) -> KeeperError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => KeeperError::io(path, io),
        other => KeeperError::Validation(format!("{}: {other:?}", path.display())),
    }
}
