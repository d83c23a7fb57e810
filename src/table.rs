//! Tabular sink for post rows (CSV, TSV or NDJSON).
//!
//! Rows go to `<final>.part` first; `finish()` flushes and promotes the part file to the
//! final name, so re-running a scan replaces the previous output rather than appending to it.

use crate::config::TableFormat;
use crate::models::{PostRecord, POST_COLUMNS};
use crate::util::{create_with_backoff, part_path_for, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// RFC 4180 quoting: wrap in quotes when the cell holds a delimiter, quote or line break.
pub fn csv_escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

/// TSV has no quoting; escape the characters that would break a row.
pub fn tsv_escape(cell: &str) -> Cow<'_, str> {
    if cell.contains(['\t', '\n', '\r', '\\']) {
        let mut s = String::with_capacity(cell.len() + 8);
        for ch in cell.chars() {
            match ch {
                '\\' => s.push_str("\\\\"),
                '\t' => s.push_str("\\t"),
                '\n' => s.push_str("\\n"),
                '\r' => s.push_str("\\r"),
                c => s.push(c),
            }
        }
        Cow::Owned(s)
    } else {
        Cow::Borrowed(cell)
    }
}

pub struct TableWriter {
    format: TableFormat,
    final_path: PathBuf,
    part_path: PathBuf,
    w: BufWriter<File>,
    rows: u64,
}

impl TableWriter {
    /// Open `<final_path>.part` and write the header row (CSV/TSV only).
    pub fn create(final_path: &Path, format: TableFormat, buf_bytes: usize) -> Result<Self> {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let part_path = part_path_for(final_path);
        let f = create_with_backoff(&part_path, 16, 50).with_context(|| format!("create {}", part_path.display()))?;
        let mut tw = Self {
            format,
            final_path: final_path.to_path_buf(),
            part_path,
            w: BufWriter::with_capacity(buf_bytes.max(8 * 1024), f),
            rows: 0,
        };
        tw.write_cells(&POST_COLUMNS)?;
        Ok(tw)
    }

    fn write_cells<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<()> {
        let csv = match self.format {
            TableFormat::Csv => true,
            TableFormat::Tsv => false,
            TableFormat::Jsonl => return Ok(()),
        };
        for (i, c) in cells.iter().enumerate() {
            if i > 0 {
                self.w.write_all(if csv { b"," } else { b"\t" })?;
            }
            let cell = if csv { csv_escape(c.as_ref()) } else { tsv_escape(c.as_ref()) };
            self.w.write_all(cell.as_bytes())?;
        }
        // CSV rows end in CRLF per RFC 4180; TSV uses plain LF.
        if self.format == TableFormat::Csv {
            self.w.write_all(b"\r\n")?;
        } else {
            self.w.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn write_post(&mut self, rec: &PostRecord) -> Result<()> {
        match self.format {
            TableFormat::Jsonl => {
                serde_json::to_writer(&mut self.w, rec)?;
                self.w.write_all(b"\n")?;
            }
            _ => self.write_cells(&rec.cells())?,
        }
        self.rows += 1;
        Ok(())
    }

    /// Flush and promote the part file. Returns the final path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.w.flush().with_context(|| format!("flush {}", self.part_path.display()))?;
        let TableWriter { final_path, part_path, w, rows, .. } = self;
        drop(w);
        replace_file_atomic_backoff(&part_path, &final_path)?;
        tracing::info!("{} rows written to {}", rows, final_path.display());
        Ok(final_path)
    }
}
