use anyhow::Context;
use cap_config::CapConfig;

use crate::cli::GlobalFlags;

/// Load `.env`, layered config, and apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<CapConfig> {
    load_dotenv()?;

    let mut config = CapConfig::load().context("failed to load capstone configuration")?;
    if let Some(db) = &flags.db {
        config.store.path.clone_from(db);
    }
    Ok(config)
}

fn load_dotenv() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded dotenv file");
            Ok(())
        }
        Err(error) if error.not_found() => Ok(()),
        Err(error) => Err(anyhow::Error::from(error).context("failed to load .env file")),
    }
}
