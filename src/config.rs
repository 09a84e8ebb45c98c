use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use toml_edit::{DocumentMut, value};

use crate::sql::DEFAULT_PSQL;
use crate::templates;

const APP_DIR: &str = "dbt";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_GLOBAL_CONFIG_DIR: &str = "/etc/xdg";
const DEFAULT_BASE_DIR: &str = ".";

/// Settings read from a config file. Every key is optional so files can be layered.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DbtConfig {
    pub base_dir: Option<String>,
    pub psql: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl DbtConfig {
    /// Overlay `other` on top of `self`; keys set in `other` win.
    pub fn merge(&mut self, other: DbtConfig) {
        if other.base_dir.is_some() {
            self.base_dir = other.base_dir;
        }
        if other.psql.is_some() {
            self.psql = other.psql;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.schema.is_some() {
            self.schema = other.schema;
        }
    }

    pub fn base_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.base_dir.as_deref().unwrap_or(DEFAULT_BASE_DIR))
    }

    pub fn psql(&self) -> &str {
        self.psql.as_deref().unwrap_or(DEFAULT_PSQL)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSource {
    Global,
    Personal,
    Explicit,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Global => "global",
            ConfigSource::Personal => "personal",
            ConfigSource::Explicit => "explicit",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigFile {
    pub path: Utf8PathBuf,
    pub source: ConfigSource,
}

/// Merged configuration plus the files that actually contributed to it.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: DbtConfig,
    pub files: Vec<ConfigFile>,
}

/// Global config location given the value of `XDG_CONFIG_DIRS`.
/// Only the first entry is consulted.
pub fn global_config_path_from(xdg_config_dirs: Option<&str>) -> Utf8PathBuf {
    let dir = xdg_config_dirs
        .and_then(|dirs| dirs.split(':').find(|d| !d.is_empty()))
        .unwrap_or(DEFAULT_GLOBAL_CONFIG_DIR);
    Utf8PathBuf::from(dir).join(APP_DIR).join(CONFIG_FILE)
}

pub fn global_config_path() -> Utf8PathBuf {
    let dirs = std::env::var("XDG_CONFIG_DIRS").ok();
    global_config_path_from(dirs.as_deref())
}

/// `$XDG_CONFIG_HOME/dbt/config.toml` or the platform equivalent.
pub fn personal_config_path() -> Result<Utf8PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow!("unable to determine config directory"))?;
    let path = Utf8PathBuf::from_path_buf(dir)
        .map_err(|_| anyhow!("config directory is not valid UTF-8"))?;
    Ok(path.join(APP_DIR).join(CONFIG_FILE))
}

/// Config files in the order they are applied.
pub fn candidate_files(explicit: Option<&Utf8Path>) -> Result<Vec<ConfigFile>> {
    let mut files = vec![
        ConfigFile {
            path: global_config_path(),
            source: ConfigSource::Global,
        },
        ConfigFile {
            path: personal_config_path()?,
            source: ConfigSource::Personal,
        },
    ];
    if let Some(path) = explicit {
        files.push(ConfigFile {
            path: path.to_owned(),
            source: ConfigSource::Explicit,
        });
    }
    Ok(files)
}

/// Load a configuration file from disk and deserialize it.
pub fn load_from_path(path: &Utf8Path) -> Result<DbtConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}

/// Apply `files` in order. Global and personal files are optional; an explicit
/// file has to exist.
pub fn load_layered(files: &[ConfigFile]) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig::default();
    for file in files {
        if file.source != ConfigSource::Explicit && !file.path.exists() {
            tracing::trace!("no {} config at {}", file.source.as_str(), file.path);
            continue;
        }
        let layer = load_from_path(&file.path)?;
        tracing::debug!("loaded {} config {}", file.source.as_str(), file.path);
        loaded.config.merge(layer);
        loaded.files.push(file.clone());
    }
    Ok(loaded)
}

pub fn write_example_config(path: &Utf8Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists; rerun with --force to overwrite", path);
    }

    templates::write_template(path, "config/example.config.toml")
}

/// Set `base_dir` in the file at `path`, keeping the rest of the document intact.
pub fn set_base_dir(path: &Utf8Path, base_dir: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent))?;
    }

    let mut doc: DocumentMut = if path.exists() {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        raw.parse()
            .with_context(|| format!("parsing config {}", path))?
    } else {
        DocumentMut::new()
    };

    doc["base_dir"] = value(base_dir);

    fs::write(path, doc.to_string()).with_context(|| format!("writing config {}", path))
}

pub fn format_summary(config: &DbtConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Base directory: {}", config.base_dir());
    let _ = writeln!(out, "SQL client: {}", config.psql());
    let _ = writeln!(
        out,
        "Database: {}",
        config.database.as_deref().unwrap_or("<unset>")
    );
    let _ = writeln!(
        out,
        "Schema: {}",
        config.schema.as_deref().unwrap_or("<unset>")
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn global_path_uses_first_xdg_entry() {
        assert_eq!(
            global_config_path_from(Some("/opt/cfg:/etc/xdg")),
            "/opt/cfg/dbt/config.toml"
        );
        assert_eq!(global_config_path_from(Some("")), "/etc/xdg/dbt/config.toml");
        assert_eq!(global_config_path_from(None), "/etc/xdg/dbt/config.toml");
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let (_tmp, root) = temp_root();
        let global = root.join("global.toml");
        let personal = root.join("personal.toml");
        fs::write(&global, "base_dir = '/srv/a'\npsql = '/usr/bin/psql'\n").unwrap();
        fs::write(&personal, "base_dir = '/srv/b'\ndatabase = 'sales'\n").unwrap();

        let loaded = load_layered(&[
            ConfigFile {
                path: global.clone(),
                source: ConfigSource::Global,
            },
            ConfigFile {
                path: personal.clone(),
                source: ConfigSource::Personal,
            },
        ])
        .unwrap();

        assert_eq!(loaded.config.base_dir(), "/srv/b");
        assert_eq!(loaded.config.psql(), "/usr/bin/psql");
        assert_eq!(loaded.config.database.as_deref(), Some("sales"));
        assert_eq!(loaded.config.schema, None);
        assert_eq!(loaded.files.len(), 2);
    }

    #[test]
    fn missing_optional_files_are_skipped() {
        let (_tmp, root) = temp_root();
        let loaded = load_layered(&[ConfigFile {
            path: root.join("nope.toml"),
            source: ConfigSource::Personal,
        }])
        .unwrap();
        assert!(loaded.files.is_empty());
        assert_eq!(loaded.config.base_dir(), ".");
        assert_eq!(loaded.config.psql(), "psql");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let (_tmp, root) = temp_root();
        let path = root.join("nope.toml");
        let err = load_layered(&[ConfigFile {
            path: path.clone(),
            source: ConfigSource::Explicit,
        }])
        .unwrap_err();
        assert!(format!("{err:#}").contains(path.as_str()));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_tmp, root) = temp_root();
        let path = root.join("bad.toml");
        fs::write(&path, "base_directory = '/srv'\n").unwrap();
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn example_config_parses_and_is_not_overwritten() {
        let (_tmp, root) = temp_root();
        let path = root.join("cfg").join("config.toml");
        write_example_config(&path, false).unwrap();
        let config = load_from_path(&path).unwrap();
        assert_eq!(config.base_dir(), ".");

        assert!(write_example_config(&path, false).is_err());
        write_example_config(&path, true).unwrap();
    }

    #[test]
    fn set_base_dir_preserves_other_keys() {
        let (_tmp, root) = temp_root();
        let path = root.join("config.toml");
        fs::write(&path, "# keep me\ndatabase = 'sales'\n").unwrap();

        set_base_dir(&path, "/srv/project").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("# keep me"));
        let config = load_from_path(&path).unwrap();
        assert_eq!(config.base_dir(), "/srv/project");
        assert_eq!(config.database.as_deref(), Some("sales"));
    }
}
