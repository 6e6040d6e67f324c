//! Location of the coach's `settings.toml`.
//!
//! Resolution order:
//!
//! | Source | Example |
//! |--------|---------|
//! | `--config <PATH>` | `./coach.toml` |
//! | `LANGUAGE_COACH_CONFIG` | `/etc/language-coach.toml` |
//! | platform config dir | `~/.config/language-coach/settings.toml` |

use std::path::{Path, PathBuf};

/// Env var naming an explicit settings file.
pub const CONFIG_PATH_ENV: &str = "LANGUAGE_COACH_CONFIG";

const APP_DIR: &str = "language-coach";
const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    /// Directory that holds the settings file.
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl AppPaths {
    /// Env override or the platform location.
    pub fn new() -> Self {
        Self::resolve(None)
    }

    /// `explicit` wins over the env override, which wins over the platform
    /// location.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let settings_file = choose_settings_file(explicit, from_env, dirs::config_dir());
        Self::for_file(settings_file)
    }

    fn for_file(settings_file: PathBuf) -> Self {
        let config_dir = settings_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn choose_settings_file(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    platform_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return path;
    }
    platform_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SETTINGS_FILE_NAME)
}
