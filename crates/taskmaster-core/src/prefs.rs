use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use tracing::{debug, info};

const USER_NAME_FILE: &str = "username.data";
const THEME_FILE: &str = "theme.data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DarkMode {
    Enabled,
    #[default]
    Disabled,
}

impl DarkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DarkMode::Enabled => "enabled",
            DarkMode::Disabled => "disabled",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DarkMode::Enabled => DarkMode::Disabled,
            DarkMode::Disabled => DarkMode::Enabled,
        }
    }
}

impl FromStr for DarkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(DarkMode::Enabled),
            "disabled" => Ok(DarkMode::Disabled),
            other => Err(anyhow!("invalid theme value: {other}")),
        }
    }
}

/// User preferences, one file per entry, independent of the task blob.
/// Loads fail soft (missing or unreadable entries fall back to defaults);
/// setters persist immediately.
#[derive(Debug)]
pub struct Preferences {
    user_name_path: PathBuf,
    theme_path: PathBuf,
    user_name: Option<String>,
    dark_mode: DarkMode,
}

impl Preferences {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Self {
        let user_name_path = data_dir.join(USER_NAME_FILE);
        let theme_path = data_dir.join(THEME_FILE);

        let user_name = read_entry(&user_name_path);
        let dark_mode: DarkMode = read_entry(&theme_path)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        debug!(
            has_user_name = user_name.is_some(),
            dark_mode = dark_mode.as_str(),
            "loaded preferences"
        );

        Self {
            user_name_path,
            theme_path,
            user_name,
            dark_mode,
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    #[tracing::instrument(skip(self, name))]
    pub fn set_user_name(&mut self, name: &str) -> anyhow::Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            debug!("ignored empty user name");
            return Ok(());
        }

        write_entry(&self.user_name_path, trimmed)?;
        self.user_name = Some(trimmed.to_string());
        info!(name = trimmed, "saved user name");
        Ok(())
    }

    pub fn dark_mode(&self) -> DarkMode {
        self.dark_mode
    }

    #[tracing::instrument(skip(self))]
    pub fn set_dark_mode(&mut self, mode: DarkMode) -> anyhow::Result<()> {
        write_entry(&self.theme_path, mode.as_str())?;
        self.dark_mode = mode;
        info!(mode = mode.as_str(), "saved theme preference");
        Ok(())
    }

    pub fn toggle_dark_mode(&mut self) -> anyhow::Result<DarkMode> {
        let next = self.dark_mode.toggled();
        self.set_dark_mode(next)?;
        Ok(next)
    }
}

fn read_entry(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn write_entry(path: &Path, value: &str) -> anyhow::Result<()> {
    fs::write(path, value).with_context(|| format!("failed writing {}", path.display()))
}
