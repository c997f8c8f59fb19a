use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{Layout, QuoteError, Result, Size};

/// Environment variable that overrides the image API key from the file.
pub const IMAGE_API_KEY_ENV: &str = "QUOTESHOT_IMAGE_API_KEY";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the key-value store
    pub data_dir: PathBuf,

    /// Root directory of the device gallery; albums are sub-directories
    pub gallery_dir: PathBuf,

    /// Key under which the favorites blob is stored
    pub storage_key: String,

    /// Album that exported images are written to
    pub album_name: String,

    /// Quote endpoints, tried once each in order
    pub quote_sources: Vec<String>,

    /// Image search endpoint
    pub image_source_url: String,

    /// API key sent in the Authorization header of image searches
    pub image_api_key: Option<String>,

    /// Background used when the image search fails
    pub default_image_url: String,

    /// Results requested per image search page
    pub images_per_page: u32,

    /// Highest page number picked when randomizing the results page
    pub max_image_page: u32,

    /// Search images by a random scenic keyword instead of the category
    pub randomize_image_keyword: bool,

    /// Timeout for each outgoing HTTP request, in seconds
    pub request_timeout_secs: u64,

    /// Size of the rendered image tile
    pub tile: Size,

    /// Assumed overlay size before the text has been measured
    pub text_box: Size,
}

impl Default for Config {
    fn default() -> Self {
        let (data_dir, gallery_dir) = match project_dirs() {
            Some(dirs) => (
                dirs.data_dir().to_path_buf(),
                dirs.data_dir().join("gallery"),
            ),
            None => (PathBuf::from(".quoteshot"), PathBuf::from(".quoteshot/gallery")),
        };

        Self {
            data_dir,
            gallery_dir,
            storage_key: "savedQuotes".to_string(),
            album_name: "QuotesApp".to_string(),
            quote_sources: vec![
                "https://api.quotable.io/random".to_string(),
                "http://api.quotable.io/random".to_string(),
            ],
            image_source_url: "https://api.pexels.com/v1/search".to_string(),
            image_api_key: None,
            default_image_url: "https://source.unsplash.com/random/800x600/?nature".to_string(),
            images_per_page: 15,
            max_image_page: 10,
            randomize_image_keyword: true,
            request_timeout_secs: 10,
            tile: Size::new(350.0, 300.0),
            text_box: Size::new(250.0, 100.0),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or from the default location
    /// when no path is given. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        let mut config = if path.exists() {
            debug!("Loading configuration from {}", path.display());
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<Config>(&content).map_err(|e| QuoteError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            })?
        } else {
            info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            Config::default()
        };

        if let Ok(key) = std::env::var(IMAGE_API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.image_api_key = Some(key);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| QuoteError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Configuration written to {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(QuoteError::ConfigError {
                message: "storage_key must not be empty".to_string(),
            });
        }
        if self.max_image_page == 0 || self.images_per_page == 0 {
            return Err(QuoteError::ConfigError {
                message: "images_per_page and max_image_page must be at least 1".to_string(),
            });
        }
        if self.tile.width <= 0.0 || self.tile.height <= 0.0 {
            return Err(QuoteError::ConfigError {
                message: "tile must have a positive size".to_string(),
            });
        }
        Ok(())
    }

    /// Tile and text box used for default overlay placement.
    pub fn layout(&self) -> Layout {
        Layout::new(self.tile, self.text_box)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "quoteshot", "quoteshot")
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.config_dir().join("config.json"),
        None => PathBuf::from(".quoteshot/config.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(config.storage_key, "savedQuotes");
        assert_eq!(config.album_name, "QuotesApp");
        assert_eq!(config.quote_sources.len(), 2);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"album_name": "Mine", "max_image_page": 3}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.album_name, "Mine");
        assert_eq!(config.max_image_page, 3);
        assert_eq!(config.storage_key, "savedQuotes");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"storage_key": ""}"#).unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(QuoteError::ConfigError { .. })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(QuoteError::ConfigError { .. })
        ));
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let config = Config {
            album_name: "Quotes".to_string(),
            randomize_image_keyword: false,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.album_name, "Quotes");
        assert!(!loaded.randomize_image_keyword);
    }
}
