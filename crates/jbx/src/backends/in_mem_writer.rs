//! # Previously, on jbx...
//!
//! 🎬 The trees were converted. They needed somewhere to go. Somewhere safe.
//! Somewhere that would let a test peek at them afterwards and say "yep, that's a Map".
//!
//! [`InMemoryWriter`] collects every record behind an `Arc<Mutex<...>>` so callers
//! can inspect what arrived. Great for assertions, great for trust issues, great for both.
//!
//! ⚠️ This is NOT for production. If you're deploying this to prod, please also deploy a therapist. 🦆

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::RecordWriter;
use crate::common::{NullKey, TypedNode};

/// 📦 A writer that never forgets.
///
/// Clone-able because tests need to peek inside after handing `self` off to the
/// emitter. The `Arc` means every clone shares the same Vec. Communist data, but in a good way.
#[derive(Debug, Default, Clone)]
pub struct InMemoryWriter {
    /// 🔒 The evidence locker. The "I told you I received that record" proof.
    pub received: Arc<Mutex<Vec<TypedNode>>>,
    closed: Arc<Mutex<bool>>,
}

impl InMemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 📋 Snapshot of everything received so far.
    pub async fn records(&self) -> Vec<TypedNode> {
        self.received.lock().await.clone()
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }
}

#[async_trait]
impl RecordWriter for InMemoryWriter {
    async fn write(&mut self, _key: NullKey, record: TypedNode) -> Result<()> {
        // 🔒 Lock, push, go home. The hero's journey in O(1) amortized time.
        self.received.lock().await.push(record);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // 🗑️ Nothing to flush. We live in RAM. We just remember that we were closed.
        *self.closed.lock().await = true;
        Ok(())
    }
}
