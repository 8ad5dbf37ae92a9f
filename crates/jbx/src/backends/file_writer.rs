//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The trees were typed. The trees were ready. The trees needed a disk.
//!
//! [`NdjsonFileWriter`] serializes each converted record as one JSON line behind a
//! `BufWriter`, so we're not doing a syscall per record like some kind of 1995 CGI
//! script. It flushes every `bulk_size` records, which is the closest a file ever
//! gets to a bulk request.
//!
//! 🚰 TypedNode → serde_json → BufWriter → disk
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, trace};

use crate::backends::RecordWriter;
use crate::common::{NullKey, TypedNode};
use crate::job::DEFAULT_BULK_SIZE;
use crate::job_context::JobContext;

/// 🚰 Writes converted records to a file, one JSON document per line.
///
/// ⚠️ `File::create` truncates if the file exists. No warning. No backup. Just gone.
/// He who runs this without checking the output path, re-indexes in shame.
#[derive(Debug)]
pub struct NdjsonFileWriter {
    file_buf: BufWriter<File>,
    bulk_size: usize,
    since_last_flush: usize,
    written: usize,
}

impl NdjsonFileWriter {
    /// 🚀 Creates (or obliterates and recreates) the output file.
    ///
    /// A `bulk_size` of zero is treated as one, because flushing every zero records
    /// is a koan, not a setting.
    pub async fn new(path: &Path, bulk_size: usize) -> Result<Self> {
        let file_handle = File::create(path).await.with_context(|| {
            format!(
                "💀 The output file '{}' could not be conjured into existence. \
                 We stared at the path. The path stared back. \
                 One of us was wrong about whether the parent directory existed.",
                path.display()
            )
        })?;
        Ok(Self {
            file_buf: BufWriter::new(file_handle),
            bulk_size: bulk_size.max(1),
            since_last_flush: 0,
            written: 0,
        })
    }

    /// 📋 Same as [`NdjsonFileWriter::new`], reading the bulk size the job was prepared with.
    pub async fn for_job(path: &Path, job_context: &JobContext) -> Result<Self> {
        let bulk_size = job_context.bulk_size().unwrap_or(DEFAULT_BULK_SIZE);
        Self::new(path, bulk_size).await
    }

    pub fn records_written(&self) -> usize {
        self.written
    }
}

#[async_trait]
impl RecordWriter for NdjsonFileWriter {
    async fn write(&mut self, _key: NullKey, record: TypedNode) -> Result<()> {
        let mut line = serde_json::to_string(&record)
            .context("💀 A typed tree refused to become JSON again. It liked being typed.")?;
        line.push('\n');
        self.file_buf
            .write_all(line.as_bytes())
            .await
            .context("💀 Failed to write a record line. The disk has opinions today.")?;
        self.written += 1;
        self.since_last_flush += 1;

        if self.since_last_flush >= self.bulk_size {
            trace!("📦 {} records buffered, flushing like it's a bulk request", self.since_last_flush);
            self.file_buf.flush().await.context("💀 Failed to flush a bulk of records")?;
            self.since_last_flush = 0;
        }
        Ok(())
    }

    /// 🗑️ Flush whatever is left. Without this, the last partial bulk sits in the
    /// buffer forever, like a letter you wrote but never sent.
    async fn close(&mut self) -> Result<()> {
        debug!("🎬 final flush after {} records", self.written);
        self.file_buf.flush().await.context(
            "💀 Error flushing output file. The bytes are still in memory. The disk remains unwritten.",
        )
    }
}
