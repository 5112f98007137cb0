use std::{env, env::VarError, fs, fs::File, io, path::PathBuf};

use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "Quaver";
const CONFIG_FILENAME: &str = "config.json";
const PLAYLIST_FILENAME: &str = "playlists.json";
const PROXY_ENV_VAR: &str = "HTTPS_PROXY";
const API_ENV_VAR: &str = "QUAVER_API";

const DEFAULT_API_BASE: &str = "https://yewtu.be";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Invidious-compatible API used for search and stream
    /// resolution.
    pub api_base: String,
    /// Explicit playlist file location.  Defaults to the platform data
    /// directory.
    pub playlist_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            playlist_file: None,
        }
    }
}

impl Config {
    fn app_dirs() -> Option<AppDirs> {
        const USE_XDG_ON_MACOS: bool = false;

        AppDirs::new(Some(APP_NAME), USE_XDG_ON_MACOS)
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::app_dirs().map(|dirs| dirs.config_dir)
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::app_dirs().map(|dirs| dirs.data_dir)
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILENAME))
    }

    pub fn load() -> Config {
        let Some(path) = Self::config_path() else {
            return Config::default();
        };
        match File::open(&path) {
            Ok(file) => {
                log::info!("loading config: {:?}", &path);
                serde_json::from_reader(file).unwrap_or_else(|err| {
                    log::warn!("ignoring unreadable config {:?}: {}", path, err);
                    Config::default()
                })
            }
            Err(_) => Config::default(),
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let (Some(dir), Some(path)) = (Self::config_dir(), Self::config_path()) else {
            return Err(io::Error::other("no config directory available"));
        };
        fs::create_dir_all(&dir)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(io::Error::other)?;
        Ok(())
    }

    /// Writes the defaults on first run, so there is a file to edit.
    pub fn save_if_missing(&self) {
        let missing = Self::config_path().map_or(false, |path| !path.exists());
        if missing {
            if let Err(err) = self.save() {
                log::warn!("failed to write default config: {}", err);
            }
        }
    }

    /// The configured API base, overridable per run with `QUAVER_API`.
    pub fn api_base(&self) -> String {
        env::var(API_ENV_VAR).unwrap_or_else(|_| self.api_base.clone())
    }

    pub fn playlist_path(&self) -> PathBuf {
        if let Some(path) = &self.playlist_file {
            return path.clone();
        }
        Self::data_dir()
            .map(|dir| dir.join(PLAYLIST_FILENAME))
            .unwrap_or_else(|| PathBuf::from(PLAYLIST_FILENAME))
    }

    pub fn proxy() -> Option<String> {
        env::var(PROXY_ENV_VAR).map_or_else(
            |err| match err {
                VarError::NotPresent => None,
                VarError::NotUnicode(_) => {
                    log::error!("proxy URL is not a valid unicode");
                    None
                }
            },
            |url| Some(url),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_public_api() {
        let config = Config::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.playlist_file, None);
    }

    #[test]
    fn explicit_playlist_file_wins_over_the_data_dir() {
        let config = Config {
            playlist_file: Some(PathBuf::from("/tmp/somewhere/playlists.json")),
            ..Config::default()
        };
        assert_eq!(
            config.playlist_path(),
            PathBuf::from("/tmp/somewhere/playlists.json")
        );
    }

    #[test]
    fn api_env_var_overrides_the_configured_base() {
        let config = Config::default();
        env::set_var(API_ENV_VAR, "https://inv.example.org");
        assert_eq!(config.api_base(), "https://inv.example.org");
        env::remove_var(API_ENV_VAR);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn proxy_comes_from_the_environment() {
        env::set_var(PROXY_ENV_VAR, "http://proxy.example.org:3128");
        assert_eq!(
            Config::proxy().as_deref(),
            Some("http://proxy.example.org:3128")
        );
        env::remove_var(PROXY_ENV_VAR);
        assert_eq!(Config::proxy(), None);
    }

    #[test]
    fn partial_config_files_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
