//! 🛡️ Job preparation — configure the job once, no matter how many times we're asked.
//!
//! 🎬 *[the framework calls prepare.]* *[the framework calls prepare again.]*
//! *[the framework has no memory of calling prepare. the framework calls prepare.]*
//!
//! Planning passes legitimately invoke preparation more than once for the same
//! job. The first call resolves the destination, writes the job settings and
//! distributes the artifacts. Every later call resolves the destination again
//! (bad locations are always bad), sees the job is already prepared, and does
//! nothing. Like a goldfish, but idempotent.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::artifacts;
use crate::backends::DistributedStore;
use crate::destination;
use crate::errors::JobError;
use crate::job_context::{
    ES_BULK_SIZE, ES_ID_FIELD_NAME, ES_INDEX_NAME, ES_IS_JSON, ES_OBJECT_TYPE, JobContext,
    JobPreparationState, NO_ID_FIELD,
};

/// 📦 Records per bulk request when nobody says otherwise.
pub const DEFAULT_BULK_SIZE: usize = 1000;
/// 🔧 Where elasticsearch.yml usually lives on the planner's box.
pub const DEFAULT_ES_CONFIG: &str = "/etc/elasticsearch/elasticsearch.yml";
/// 🔌 Where the plugins directory usually lives on the planner's box.
pub const DEFAULT_ES_PLUGINS: &str = "/usr/local/share/elasticsearch/plugins";

/// 🔧 The knobs a job is constructed with. All optional, all defaulted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StoreOptions {
    /// 🆔 Record field holding the document id. `None` means records have no id.
    #[serde(default)]
    pub id_field_name: Option<String>,
    /// 📦 Records per bulk request. Configured here, enforced by the writer.
    #[serde(default = "default_bulk_size")]
    pub bulk_size: usize,
    /// 📄 Local elasticsearch.yml to ship to every task.
    #[serde(default = "default_es_config")]
    pub es_config: PathBuf,
    /// 🔌 Local plugins directory to ship to every task.
    #[serde(default = "default_es_plugins")]
    pub es_plugins: PathBuf,
}

fn default_bulk_size() -> usize {
    DEFAULT_BULK_SIZE
}

fn default_es_config() -> PathBuf {
    PathBuf::from(DEFAULT_ES_CONFIG)
}

fn default_es_plugins() -> PathBuf {
    PathBuf::from(DEFAULT_ES_PLUGINS)
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            id_field_name: None,
            bulk_size: default_bulk_size(),
            es_config: default_es_config(),
            es_plugins: default_es_plugins(),
        }
    }
}

/// 🛡️ Prepare the job exactly once.
///
/// - Invalid location → [`JobError::InvalidDestination`], every time, prepared or not.
/// - Already prepared → no-op.
/// - Previously failed → [`JobError::PreparationFailure`] again. Failure is terminal.
/// - Otherwise: write the settings, distribute artifacts, and become `Prepared`.
///   If distribution fails the job becomes `Failed` and the error comes back as
///   [`JobError::PreparationFailure`].
///
/// Takes `&mut JobContext`, so the check and the set can't be interleaved with anyone else's.
pub async fn prepare(
    location: &str,
    options: &StoreOptions,
    job_context: &mut JobContext,
    store: &dyn DistributedStore,
) -> Result<(), JobError> {
    let destination = destination::resolve(location)?;

    match job_context.preparation_state() {
        JobPreparationState::Prepared { .. } => {
            debug!("🛡️ job already prepared for {destination}, leaving everything as it was");
            return Ok(());
        }
        JobPreparationState::Failed { reason } => {
            return Err(JobError::PreparationFailure {
                reason: format!("an earlier preparation attempt failed: {reason}"),
            });
        }
        JobPreparationState::Unprepared => {}
    }

    info!("🛡️ preparing job for {destination}");
    job_context.set(ES_INDEX_NAME, destination.index());
    job_context.set(ES_OBJECT_TYPE, destination.object_type());
    job_context.set_bool(ES_IS_JSON, true);
    job_context.set(ES_BULK_SIZE, options.bulk_size.to_string());
    job_context.set(
        ES_ID_FIELD_NAME,
        options.id_field_name.as_deref().unwrap_or(NO_ID_FIELD),
    );

    match artifacts::distribute(&options.es_config, &options.es_plugins, job_context, store).await {
        Ok(()) => {
            job_context.set_preparation_state(JobPreparationState::Prepared { destination });
            Ok(())
        }
        Err(err) => {
            let failure = JobError::preparation_failure(&err);
            warn!("💀 job preparation failed: {err:#}");
            job_context.set_preparation_state(JobPreparationState::Failed {
                reason: format!("{err:#}"),
            });
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_context::{ArtifactKind, ShippedArtifact};
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 🧮 A store that counts every call and optionally refuses uploads.
    #[derive(Debug, Default)]
    struct CountingStore {
        uploads: AtomicUsize,
        ships: AtomicUsize,
        refuse_uploads: bool,
    }

    #[async_trait]
    impl DistributedStore for CountingStore {
        async fn upload(&self, _local_path: &Path, remote_path: &str) -> Result<()> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.refuse_uploads {
                bail!("store is on a coffee break, cannot take {remote_path}");
            }
            Ok(())
        }

        async fn ship_file(&self, remote_path: &str) -> Result<ShippedArtifact> {
            self.ships.fetch_add(1, Ordering::SeqCst);
            Ok(ShippedArtifact { remote_path: remote_path.to_string(), kind: ArtifactKind::File })
        }

        async fn ship_archive(&self, remote_path: &str) -> Result<ShippedArtifact> {
            self.ships.fetch_add(1, Ordering::SeqCst);
            Ok(ShippedArtifact { remote_path: remote_path.to_string(), kind: ArtifactKind::Archive })
        }
    }

    #[tokio::test]
    async fn the_one_where_prepare_twice_distributes_once() -> Result<()> {
        let store = CountingStore::default();
        let options = StoreOptions::default();
        let mut ctx = JobContext::new();

        prepare("es://tweets/tweet", &options, &mut ctx, &store).await?;
        prepare("es://tweets/tweet", &options, &mut ctx, &store).await?;

        // 🎯 one upload + one ship per artifact, total. Not per call.
        assert_eq!(store.uploads.load(Ordering::SeqCst), 2);
        assert_eq!(store.ships.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.shipped_artifacts().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_all_the_settings_land_in_the_context() -> Result<()> {
        let store = CountingStore::default();
        let options = StoreOptions {
            id_field_name: Some("tweet_id".to_string()),
            bulk_size: 250,
            ..StoreOptions::default()
        };
        let mut ctx = JobContext::new();
        prepare("es://tweets/tweet", &options, &mut ctx, &store).await?;

        assert_eq!(ctx.get(ES_INDEX_NAME), Some("tweets"));
        assert_eq!(ctx.get(ES_OBJECT_TYPE), Some("tweet"));
        assert!(ctx.get_bool(ES_IS_JSON));
        assert_eq!(ctx.bulk_size(), Some(250));
        assert_eq!(ctx.id_field_name(), Some("tweet_id"));
        assert_eq!(ctx.destination().map(|d| d.index()), Some("tweets"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_no_id_field_means_the_sentinel() -> Result<()> {
        let mut ctx = JobContext::new();
        prepare("es://a/b", &StoreOptions::default(), &mut ctx, &CountingStore::default()).await?;
        assert_eq!(ctx.get(ES_ID_FIELD_NAME), Some(NO_ID_FIELD));
        assert_eq!(ctx.id_field_name(), None);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_later_call_cannot_rewrite_history() -> Result<()> {
        let store = CountingStore::default();
        let mut ctx = JobContext::new();
        prepare("es://first/doc", &StoreOptions::default(), &mut ctx, &store).await?;
        prepare("es://second/doc", &StoreOptions::default(), &mut ctx, &store).await?;
        assert_eq!(ctx.get(ES_INDEX_NAME), Some("first"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_bad_location_fails_before_anything_is_written() {
        let store = CountingStore::default();
        let mut ctx = JobContext::new();
        let err = prepare("es://just-an-index", &StoreOptions::default(), &mut ctx, &store)
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::InvalidDestination { .. }));
        assert_eq!(ctx.get(ES_INDEX_NAME), None);
        assert_eq!(ctx.preparation_state(), &JobPreparationState::Unprepared);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn the_one_where_a_bad_location_is_still_bad_after_preparation() -> Result<()> {
        let store = CountingStore::default();
        let mut ctx = JobContext::new();
        prepare("es://a/b", &StoreOptions::default(), &mut ctx, &store).await?;
        let err = prepare("es://a/b/c", &StoreOptions::default(), &mut ctx, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidDestination { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_failed_upload_is_terminal() {
        let store = CountingStore { refuse_uploads: true, ..CountingStore::default() };
        let mut ctx = JobContext::new();

        let first = prepare("es://a/b", &StoreOptions::default(), &mut ctx, &store).await.unwrap_err();
        assert!(matches!(first, JobError::PreparationFailure { .. }), "got {first:?}");
        assert!(matches!(ctx.preparation_state(), JobPreparationState::Failed { .. }));

        let second = prepare("es://a/b", &StoreOptions::default(), &mut ctx, &store).await.unwrap_err();
        assert!(matches!(second, JobError::PreparationFailure { .. }), "got {second:?}");
        // 🔒 No second attempt at the store. Failed means failed.
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }
}
