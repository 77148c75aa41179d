use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Once,
};

use dirs::home_dir;

use crate::errors::Result;

const DEFAULT_DIR_NAME: &str = ".finance_vault";
const HOME_ENV: &str = "FINANCE_VAULT_HOME";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "finance_vault=info".parse() {
            filter = filter.add_directive(directive);
        }

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Returns the application data directory, defaulting to `~/.finance_vault`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `data` next to `path` first and renames it into place.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = path.with_extension(TMP_SUFFIX);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
