//! 📤 Record emission — one raw record in, at most one typed tree out.
//!
//! 🎬 *[a tuple arrives. field zero holds a JSON string. or null. or "{not json".]*
//!
//! The rules, in order of how often they ruin someone's night:
//! - null payload → skip it. No emission, no error, no drama.
//! - payload that won't decode → log it, forward an empty record, keep going.
//!   A single bad line never stops a ten-million-line batch.
//! - payload that decodes → convert it and forward it with a [`NullKey`].
//! - writer says no → [`JobError::EmissionFailure`]. That one IS fatal.
//!
//! Each task owns its own emitter and its own writer. The job context is only
//! read, once, when the emitter is built. 🦆

use tracing::{trace, warn};

use crate::backends::RecordWriter;
use crate::common::{NullKey, TypedNode};
use crate::destination::Destination;
use crate::errors::JobError;
use crate::job_context::JobContext;
use crate::transforms::{IngestTransform, JsonObjectIngest};

/// 📍 Position of the JSON payload in a raw record.
pub const JSON_FIELD_POSITION: usize = 0;

/// 🧾 One record as the batch engine hands it over: a tuple of nullable fields.
///
/// Fields are raw bytes. "Text" from the outside world is UTF-8 on a good day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    fields: Vec<Option<Vec<u8>>>,
}

impl RawRecord {
    pub fn new(fields: Vec<Option<Vec<u8>>>) -> Self {
        Self { fields }
    }

    /// 🧾 The usual shape: a single field holding the JSON payload.
    pub fn from_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(vec![Some(payload.into())])
    }

    /// 🕳️ A single-field record whose field is null.
    pub fn null() -> Self {
        Self::new(vec![None])
    }

    /// 📦 The JSON payload, or `None` if the field is null or missing entirely.
    pub fn json_payload(&self) -> Option<&[u8]> {
        self.fields.get(JSON_FIELD_POSITION)?.as_deref()
    }
}

/// 🚦 What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// ✅ Decoded, converted, forwarded.
    Forwarded,
    /// ⚠️ Didn't decode; an empty record was forwarded in its place.
    Degraded,
    /// 🕳️ Null payload; nothing forwarded.
    Skipped,
}

/// 📊 Running tally for one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitStats {
    pub forwarded: usize,
    pub degraded: usize,
    pub skipped: usize,
}

impl EmitStats {
    fn record(&mut self, outcome: EmitOutcome) {
        match outcome {
            EmitOutcome::Forwarded => self.forwarded += 1,
            EmitOutcome::Degraded => self.degraded += 1,
            EmitOutcome::Skipped => self.skipped += 1,
        }
    }

    /// 📬 Records that actually reached the writer, degraded or not.
    pub fn emitted(&self) -> usize {
        self.forwarded + self.degraded
    }
}

/// 📤 Decodes, converts and forwards records for one task.
#[derive(Debug)]
pub struct RecordEmitter<W: RecordWriter> {
    writer: W,
    destination: Destination,
    stats: EmitStats,
}

impl<W: RecordWriter> RecordEmitter<W> {
    /// 🏗️ Build an emitter for a prepared job.
    ///
    /// Artifacts must be distributed before any record is emitted, so an
    /// unprepared (or failed) job context gets [`JobError::NotPrepared`].
    pub fn new(job_context: &JobContext, writer: W) -> Result<Self, JobError> {
        let destination = job_context.destination().cloned().ok_or(JobError::NotPrepared)?;
        Ok(Self {
            writer,
            destination,
            stats: EmitStats::default(),
        })
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    /// 📤 Handle one record. Only a writer failure comes back as an error.
    pub async fn emit(&mut self, record: &RawRecord) -> Result<EmitOutcome, JobError> {
        let Some(payload) = record.json_payload() else {
            trace!("🕳️ null payload, skipping record");
            self.stats.record(EmitOutcome::Skipped);
            return Ok(EmitOutcome::Skipped);
        };

        let (tree, outcome) = match JsonObjectIngest::transform_record(payload) {
            Ok(tree) => (tree, EmitOutcome::Forwarded),
            Err(err) => {
                warn!("⚠️ malformed record for {}, forwarding it empty: {err:#}", self.destination);
                (TypedNode::empty_map(), EmitOutcome::Degraded)
            }
        };

        self.writer
            .write(NullKey, tree)
            .await
            .map_err(|err| JobError::emission_failure(&err))?;
        self.stats.record(outcome);
        Ok(outcome)
    }

    /// 🗑️ Close the writer and hand back the final tally.
    pub async fn close(mut self) -> Result<EmitStats, JobError> {
        self.writer
            .close()
            .await
            .map_err(|err| JobError::emission_failure(&err))?;
        Ok(self.stats)
    }
}
