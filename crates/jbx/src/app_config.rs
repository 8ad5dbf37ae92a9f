//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::job::StoreOptions;

/// 📦 Everything a run needs: where to index, how to prepare, what to read and write.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 🧭 `es://<index>/<objectType>`. Required. We are not guessing your index name.
    pub location: String,
    #[serde(default)]
    pub store: StoreOptions,
    pub runtime: RuntimeConfig,
}

/// 🧵 The knobs for the local run loop.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// 📥 One raw JSON payload per line. A blank line is a null payload.
    pub input_file: PathBuf,
    /// 📤 One converted record per line. Truncated on start. You've been warned.
    pub output_file: PathBuf,
    /// 🗄️ Root directory of the local distributed store.
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("/tmp/jbx-store")
}

/// 🚀 Load the config from env vars (`JBX_*`) and, optionally, a TOML file.
///
/// - `config_file_name` is None → env vars only.
/// - `config_file_name` is Some → env vars + TOML file, merged. TOML wins on conflicts.
///
/// Nested keys in env vars use a double underscore: `JBX_STORE__BULK_SIZE=500`.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("JBX_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (JBX_*). \
             The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (JBX_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
