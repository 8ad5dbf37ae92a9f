//! 🔌 Backends — the collaborators at the edges of the bridge.
//!
//! 🗄️ A [`DistributedStore`] takes local files and makes them reachable by every task.
//! 🚰 A [`RecordWriter`] takes converted trees and sends them on their merry way.
//!
//! 🎭 This module is the casting agency. The real cluster filesystem and the real
//! bulk indexer are external. What lives here are honest stand-ins: a store that
//! copies into a local directory, a writer that hoards in RAM for tests, and a
//! writer that lays NDJSON down on disk.
//!
//! 🦆 The duck is here because every file must have one. This is law.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{NullKey, TypedNode};
use crate::job_context::ShippedArtifact;

pub mod file_writer;
pub mod in_mem_writer;
pub mod local_store;

pub use file_writer::NdjsonFileWriter;
pub use in_mem_writer::InMemoryWriter;
pub use local_store::LocalFsStore;

// ===== Distributed Store =====

/// 🗄️ The shared store every task can read from.
///
/// # Contract
/// - `upload` copies a local file or directory to a remote path, overwriting what's there
/// - `ship_file` / `ship_archive` register an already-uploaded remote path for shipping
///   and hand back the reference
/// - No retries at this layer. If the store wants retries, the store does retries.
#[async_trait]
pub trait DistributedStore: std::fmt::Debug + Send + Sync {
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()>;
    async fn ship_file(&self, remote_path: &str) -> Result<ShippedArtifact>;
    async fn ship_archive(&self, remote_path: &str) -> Result<ShippedArtifact>;
}

// ===== Record Writer =====

/// 🕳️ The downstream writer that consumes `(key, tree)` pairs.
///
/// The yin to the emitter's yang. The drain at the bottom of the pipeline tub.
///
/// # Contract
/// - `write` accepts one record. An `Err` is fatal to the task.
/// - `close` flushes and finalizes. MUST be called. Skipping it is a bug, and also rude.
#[async_trait]
pub trait RecordWriter: std::fmt::Debug + Send {
    async fn write(&mut self, key: NullKey, record: TypedNode) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}
