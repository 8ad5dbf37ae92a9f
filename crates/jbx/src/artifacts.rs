//! 📦 Artifact distribution — getting elasticsearch.yml and the plugins dir to every task.
//!
//! 🎬 *[a config file sits on the planner's disk. a thousand tasks need it.]*
//! *[none of them can see the planner's disk. this is the whole problem.]*
//!
//! Four steps, fixed order, no retries:
//! 1. upload the config file to its well-known remote path
//! 2. ship it as a file
//! 3. upload the plugins directory to its well-known remote path
//! 4. ship it as an archive
//!
//! Any one of them failing is the same failure: the job doesn't start. 🦆

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::backends::DistributedStore;
use crate::job_context::JobContext;

/// 📍 Where the config file lands in the distributed store.
pub const ES_CONFIG_REMOTE_PATH: &str = "/tmp/elasticsearch/elasticsearch.yml";
/// 📍 Where the plugins directory lands in the distributed store.
pub const ES_PLUGINS_REMOTE_PATH: &str = "/tmp/elasticsearch/plugins";

/// 🚚 Upload and ship the config file and plugins directory, registering both in the job context.
///
/// Only ever called from a first-time preparation. Errors carry context for
/// whichever of the four steps broke; the guard turns them into a `PreparationFailure`.
pub async fn distribute(
    local_config: &Path,
    local_plugins: &Path,
    job_context: &mut JobContext,
    store: &dyn DistributedStore,
) -> Result<()> {
    store
        .upload(local_config, ES_CONFIG_REMOTE_PATH)
        .await
        .with_context(|| format!("uploading config '{}'", local_config.display()))?;
    let config_ref = store
        .ship_file(ES_CONFIG_REMOTE_PATH)
        .await
        .context("shipping config file")?;
    if !job_context.register_shipped(config_ref) {
        debug!("🎟️ config file was already on the shipping manifest");
    }

    store
        .upload(local_plugins, ES_PLUGINS_REMOTE_PATH)
        .await
        .with_context(|| format!("uploading plugins '{}'", local_plugins.display()))?;
    let plugins_ref = store
        .ship_archive(ES_PLUGINS_REMOTE_PATH)
        .await
        .context("shipping plugins archive")?;
    if !job_context.register_shipped(plugins_ref) {
        debug!("🎟️ plugins archive was already on the shipping manifest");
    }

    info!(
        "🚚 artifacts distributed: {} and {}",
        ES_CONFIG_REMOTE_PATH, ES_PLUGINS_REMOTE_PATH
    );
    Ok(())
}
