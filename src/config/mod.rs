use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::storage::is_valid_slot_key;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NotesCore";
const APP_NAME: &str = "notes";

pub const DEFAULT_SLOT_KEY: &str = "notes";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths);
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub backup_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;
        let config_dir = project_dirs.config_dir().to_path_buf();
        let data_dir = project_dirs.data_dir().to_path_buf();
        Ok(Self::from_dirs(config_dir, data_dir))
    }

    /// Lays every directory out under `root`.
    pub fn rooted(root: &Path) -> Self {
        Self::from_dirs(root.join("config"), root.join("data"))
    }

    fn from_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            database_path: data_dir.join("notes.db"),
            backup_dir: data_dir.join("backups"),
            data_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.backup_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub storage: StorageOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            storage: StorageOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        if !is_valid_slot_key(&self.storage.slot_key) {
            tracing::warn!(
                slot_key = %self.storage.slot_key,
                "invalid slot key in config, falling back to {DEFAULT_SLOT_KEY}"
            );
            self.storage.slot_key = DEFAULT_SLOT_KEY.to_string();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub backend: BackendKind,
    pub slot_key: String,
    pub wal_autocheckpoint: u32,
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(skip)]
    pub database_path: PathBuf,
    #[serde(skip)]
    pub backup_dir: PathBuf,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            wal_autocheckpoint: 1000,
            data_dir: PathBuf::new(),
            database_path: PathBuf::new(),
            backup_dir: PathBuf::new(),
        }
    }
}

impl StorageOptions {
    pub fn resolve(&mut self, paths: &ConfigPaths) {
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = paths.data_dir.clone();
        }
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
        if self.backup_dir.as_os_str().is_empty() {
            self.backup_dir = paths.backup_dir.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_or_init_writes_default_config() -> Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::rooted(temp.path()));
        let cfg = loader.load_or_init()?;

        assert!(loader.paths().config_file.exists());
        assert!(loader.paths().backup_dir.is_dir());
        assert_eq!(cfg.storage.backend, BackendKind::File);
        assert_eq!(cfg.storage.slot_key, DEFAULT_SLOT_KEY);
        assert_eq!(cfg.storage.data_dir, temp.path().join("data"));

        let written = fs::read_to_string(&loader.paths().config_file)?;
        assert!(written.contains("backend = \"file\""), "{written}");
        assert!(!written.contains("data_dir"), "resolved paths stay out of the file");
        Ok(())
    }

    #[test]
    fn load_reads_partial_config_and_keeps_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "log_level = \"debug\"\n[storage]\nbackend = \"sqlite\"\n",
        )?;

        let cfg = ConfigLoader::with_paths(paths.clone()).load_or_init()?;
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.storage.backend, BackendKind::Sqlite);
        assert_eq!(cfg.storage.wal_autocheckpoint, 1000);
        assert_eq!(cfg.storage.database_path, paths.database_path);
        Ok(())
    }

    #[test]
    fn invalid_slot_key_falls_back_to_default() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "[storage]\nslot_key = \"../oops\"\n")?;

        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.storage.slot_key, DEFAULT_SLOT_KEY);
        Ok(())
    }

    #[test]
    fn malformed_config_is_an_error() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "[storage]\nbackend = \"floppy\"\n")?;
        assert!(ConfigLoader::with_paths(paths).load().is_err());
        Ok(())
    }
}
