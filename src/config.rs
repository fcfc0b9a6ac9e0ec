//! The raw configuration model and the config file loader.
//!
//! A config file is YAML, JSON or TOML, chosen by its extension. Unless a
//! path is given on the command line, `~/.rsyncdaemoncfg.yaml` is used.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::error::LoadError;
use crate::path_util::expand_home;
use crate::permissions::{ProcessIdentity, resolve_by_path};
use crate::volume::VolumeDescriptor;

/// Default configuration file name, looked up in the home directory.
pub const DEFAULT_CONFIG_FILENAME: &str = ".rsyncdaemoncfg.yaml";

/// One include or exclude rule.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: PathBuf,
    /// Must be true when `path` is a directory.
    #[serde(default)]
    pub recursive: bool,
}

impl PathEntry {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }
}

/// The configuration as written by the user, before any validation.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RawConfig {
    /// Files or directories to include in the backup.
    pub include: Vec<PathEntry>,
    /// Files or directories to exclude from the backup. Carried through
    /// resolution untouched.
    pub exclude: Vec<PathEntry>,
    /// The volume to back up to.
    #[serde(alias = "backupVolume")]
    pub backup_volume: Option<VolumeDescriptor>,
    /// Directory on the backup volume, relative to its mount point. Empty
    /// means the root of the volume.
    #[serde(alias = "backupDir")]
    pub backup_dir: String,
}

impl RawConfig {
    /// Decodes a config document.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self, LoadError> {
        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
            ConfigFormat::Json => serde_json::from_str(contents)?,
            ConfigFormat::Toml => toml::from_str(contents)?,
        };
        Ok(config)
    }

    fn expand_home_paths(mut self) -> Self {
        for entry in self.include.iter_mut().chain(self.exclude.iter_mut()) {
            if let Some(path) = entry.path.to_str() {
                entry.path = expand_home(path);
            }
        }
        self
    }
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(LoadError::UnsupportedFormat(ext)),
        }
    }
}

/// Where config files are looked up when none is named explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub default_dir: PathBuf,
}

impl ConfigPaths {
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
        }
    }

    /// Uses the current user's home directory.
    pub fn from_home() -> Result<Self, LoadError> {
        dirs::home_dir().map(Self::new).ok_or(LoadError::NoHomeDir)
    }

    pub fn default_file(&self) -> PathBuf {
        self.default_dir.join(DEFAULT_CONFIG_FILENAME)
    }

    /// Picks the config file to load for a user-supplied path.
    ///
    /// A directory is assumed to contain [`DEFAULT_CONFIG_FILENAME`]; an
    /// existing file is used as is. Anything else falls back to the default
    /// file.
    pub fn locate(&self, requested: Option<&Path>) -> PathBuf {
        let default_file = self.default_file();
        let Some(requested) = requested else {
            return default_file;
        };

        if requested.is_dir() {
            let file = requested.join(DEFAULT_CONFIG_FILENAME);
            if !file.exists() {
                warn!(
                    "{DEFAULT_CONFIG_FILENAME} does not exist in directory {}",
                    requested.display()
                );
            }
            file
        } else if requested.exists() {
            requested.to_path_buf()
        } else {
            warn!(
                "{} is not a valid file or directory, defaulting to {}",
                requested.display(),
                default_file.display()
            );
            default_file
        }
    }
}

/// Reads and decodes the config file at `path`.
///
/// The file must be readable by `identity`. Include and exclude paths
/// starting with `~` or `$HOME` are expanded.
pub fn load_config(path: &Path, identity: &ProcessIdentity) -> Result<RawConfig, LoadError> {
    let format = ConfigFormat::from_path(path)?;
    if !resolve_by_path(path, identity)?.readable {
        return Err(LoadError::Unreadable(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("loaded {:?} config from {}", format, path.display());
    Ok(RawConfig::parse(&contents, format)?.expand_home_paths())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const YAML: &str = "\
include:
  - path: /data
    recursive: true
  - path: ~/notes.txt
exclude:
  - path: /data/cache
backup_volume:
  mount_path: /Volumes/Backup
backup_dir: nightly
";

    #[test]
    fn test_parse_yaml() {
        let config = RawConfig::parse(YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.include.len(), 2);
        assert_eq!(config.include[0], PathEntry::new("/data", true));
        assert!(!config.include[1].recursive);
        assert_eq!(config.exclude, vec![PathEntry::new("/data/cache", false)]);
        assert_eq!(
            config.backup_volume,
            Some(VolumeDescriptor::by_mount_path("/Volumes/Backup"))
        );
        assert_eq!(config.backup_dir, "nightly");
    }

    #[test]
    fn test_parse_json_camel_case() {
        let json = r#"{
            "include": [{"path": "/data", "recursive": true}],
            "backupVolume": {"device": "/dev/sdb1"},
            "backupDir": ""
        }"#;
        let config = RawConfig::parse(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.include, vec![PathEntry::new("/data", true)]);
        assert!(config.exclude.is_empty());
        assert_eq!(config.backup_volume, Some(VolumeDescriptor::by_device("/dev/sdb1")));
        assert!(config.backup_dir.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
backup_dir = "daily"

[[include]]
path = "/srv"
recursive = true

[backup_volume]
name = "Backup"
"#;
        let config = RawConfig::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.include, vec![PathEntry::new("/srv", true)]);
        assert_eq!(config.backup_volume, Some(VolumeDescriptor::by_name("Backup")));
        assert_eq!(config.backup_dir, "daily");
    }

    #[test]
    fn test_missing_fields_default() {
        let config = RawConfig::parse("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config, RawConfig::default());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.YAML")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")).unwrap(), ConfigFormat::Json);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("a.ini")),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "ini"
        ));
        assert!(ConfigFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_locate() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        let paths = ConfigPaths::new(home.path());
        let default_file = home.path().join(DEFAULT_CONFIG_FILENAME);
        assert_eq!(paths.locate(None), default_file);

        let dir = TempDir::new()?;
        assert_eq!(
            paths.locate(Some(dir.path())),
            dir.path().join(DEFAULT_CONFIG_FILENAME)
        );

        let file = dir.path().join("custom.json");
        fs::write(&file, "{}")?;
        assert_eq!(paths.locate(Some(file.as_path())), file);

        let missing = dir.path().join("missing.yaml");
        assert_eq!(paths.locate(Some(missing.as_path())), default_file);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_load_config() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&file, YAML)?;

        let config = load_config(&file, &ProcessIdentity::current()?)?;
        assert_eq!(config.include[0].path, PathBuf::from("/data"));
        assert_eq!(config.include[1].path, expand_home("~/notes.txt"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_load_config_unreadable() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let file = dir.path().join("config.json");
        fs::write(&file, "{}")?;
        fs::set_permissions(&file, fs::Permissions::from_mode(0o200))?;

        let err = load_config(&file, &ProcessIdentity::current()?).unwrap_err();
        assert!(matches!(err, LoadError::Unreadable(_)));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_load_config_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_config(
            &dir.path().join("missing.yaml"),
            &ProcessIdentity::current().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Permission(ref e) if e.is_not_found()));
    }
}
