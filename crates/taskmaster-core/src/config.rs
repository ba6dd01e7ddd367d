use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::info;

const DATA_DIR_ENV_VAR: &str = "TASKMASTER_DATA";
const COLOR_ENV_VAR: &str = "TASKMASTER_COLOR";

/// Resolves the data directory: `--data` flag, then `TASKMASTER_DATA`,
/// then `~/.taskmaster`. The directory is created if missing.
#[tracing::instrument(skip(override_dir))]
pub fn resolve_data_dir(override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Ok(env_value) = std::env::var(DATA_DIR_ENV_VAR) {
        expand_tilde(Path::new(env_value.trim()))
    } else {
        default_data_dir()?
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

/// Color output defaults on; `TASKMASTER_COLOR` overrides either way.
pub fn color_enabled() -> bool {
    match std::env::var(COLOR_ENV_VAR) {
        Ok(raw) => parse_bool(&raw),
        Err(_) => true,
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".taskmaster"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn bool_values_parse_loosely() {
        assert!(parse_bool("yes"));
        assert!(parse_bool(" ON "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("off"));
        assert!(!parse_bool("nope"));
        assert!(!parse_bool(""));
    }
}
