//! 🗂️ Job Context — the shared configuration store for a single distributed job.
//!
//! 🎬 *[a clipboard hangs on the wall of the job planning office]*
//! *[every task will read it. only the planner may write on it. once.]*
//!
//! The context holds three things:
//! - string settings under well-known keys (what the indexer downstream reads)
//! - the artifacts shipped to every task via the shared cache
//! - the [`JobPreparationState`], which is the idempotency flag made explicit
//!
//! 🔒 Writes need `&mut JobContext`. Tasks get `&JobContext` (or an `Arc`).
//! The borrow checker is the lock. It has never once taken a sick day. 🦆

use std::collections::HashMap;

use crate::destination::Destination;

/// 📡 Destination index name.
pub const ES_INDEX_NAME: &str = "elasticsearch.index.name";
/// 📡 Destination object type.
pub const ES_OBJECT_TYPE: &str = "elasticsearch.object.type";
/// 🧾 Payloads are already JSON, no field-name mapping needed downstream.
pub const ES_IS_JSON: &str = "elasticsearch.is_json";
/// 📦 Records per bulk request, for the writer to honor.
pub const ES_BULK_SIZE: &str = "elasticsearch.bulk.size";
/// 🆔 Which record field holds the document id.
pub const ES_ID_FIELD_NAME: &str = "elasticsearch.id.field.name";

/// 🆔 Sentinel stored under [`ES_ID_FIELD_NAME`] meaning "records have no id field".
pub const NO_ID_FIELD: &str = "-1";

/// 🚦 Where a job is in its preparation lifecycle.
///
/// ```text
/// Unprepared ──prepare ok──▶ Prepared { destination }
///      │
///      └──prepare failed──▶ Failed { reason }   (terminal)
/// ```
///
/// Set exactly once, never reset. A job is prepared once no matter how many
/// times the framework knocks on the door.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobPreparationState {
    #[default]
    Unprepared,
    Prepared {
        destination: Destination,
    },
    Failed {
        reason: String,
    },
}

/// 📦 How an artifact rides the shared cache to every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// 📄 Shipped as-is, one file.
    File,
    /// 🗜️ Shipped as an archive, unpacked on the task side.
    Archive,
}

/// 🎟️ A reference to something already living in the distributed store and registered for shipping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShippedArtifact {
    pub remote_path: String,
    pub kind: ArtifactKind,
}

/// 🗂️ Shared configuration for one job. See the module docs for who may touch what.
#[derive(Debug, Default, Clone)]
pub struct JobContext {
    settings: HashMap<String, String>,
    shipped: Vec<ShippedArtifact>,
    state: JobPreparationState,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// ✏️ Write a setting. Crate-private: only the preparation guard writes settings.
    pub(crate) fn set(&mut self, key: &str, value: impl Into<String>) {
        self.settings.insert(key.to_string(), value.into());
    }

    pub(crate) fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, value.to_string());
    }

    /// ✅ Anything other than a literal `"true"` is false. Strict, like a bouncer with a clipboard.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// 📦 Bulk size as a number, if it was set and parses.
    pub fn bulk_size(&self) -> Option<usize> {
        self.get(ES_BULK_SIZE).and_then(|raw| raw.parse().ok())
    }

    /// 🆔 The configured id field, with the `-1` sentinel translated back into `None`.
    pub fn id_field_name(&self) -> Option<&str> {
        self.get(ES_ID_FIELD_NAME).filter(|name| *name != NO_ID_FIELD)
    }

    pub fn shipped_artifacts(&self) -> &[ShippedArtifact] {
        &self.shipped
    }

    /// 🎟️ Register an artifact for shipping unless it's already on the manifest.
    /// Returns `true` if it was newly registered.
    pub(crate) fn register_shipped(&mut self, artifact: ShippedArtifact) -> bool {
        if self.shipped.contains(&artifact) {
            return false;
        }
        self.shipped.push(artifact);
        true
    }

    pub fn preparation_state(&self) -> &JobPreparationState {
        &self.state
    }

    /// 📍 The frozen destination, once (and only once) the job is prepared.
    pub fn destination(&self) -> Option<&Destination> {
        match &self.state {
            JobPreparationState::Prepared { destination } => Some(destination),
            _ => None,
        }
    }

    pub(crate) fn set_preparation_state(&mut self, state: JobPreparationState) {
        self.state = state;
    }
}
