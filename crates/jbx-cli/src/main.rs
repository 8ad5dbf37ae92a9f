//! 🚀 jbx-cli — the front door, the bouncer, the maitre d' of jbx.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 Thin CLI wrapper: sets up logging, loads config, hands off to `jbx::run`.
//! Like a manager. 🦆

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 🚀 main() — where it all begins.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Grab the config path (first arg, or `jbx.toml`)
/// 3. Load config
/// 4. Prepare the job and push every record across the bridge
/// 5. Handle errors (cry, then exit 1)
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path_arg = std::env::args().nth(1).unwrap_or_else(|| "jbx.toml".to_string());

    // 🔒 A missing file is fine (env vars only). An unreadable path is not.
    let config_file = std::path::Path::new(&path_arg);
    let config_file_if_it_exists = match config_file.try_exists().with_context(|| {
        format!(
            "💀 Couldn't check whether the configuration file exists. If it's a relative path, \
             try an absolute one. Was checking here: '{}'",
            config_file.display()
        )
    })? {
        true => Some(config_file),
        false => None,
    };

    let app_config = jbx::app_config::load_config(config_file_if_it_exists).context(
        "💀 In jbx-cli, main, we couldn't load the config. Check the location, the runtime \
         section, and any JBX_* environment variables you forgot you exported.",
    )?;

    match jbx::run(app_config).await {
        Ok(stats) => {
            info!("🍾 done: {} records emitted", stats.emitted());
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // 🧅 peel the onion of sadness, one layer at a time
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
            }
            std::process::exit(1);
        }
    }
}
