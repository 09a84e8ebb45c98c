//! Canonical locations inside the managed layout.
//!
//! Everything here is plain path composition: nothing touches the filesystem
//! and no identifier is validated. An empty database name simply yields a
//! path ending in `databases/`; the hierarchy walker is what notices.

use anyhow::{Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;

pub const DBT_DIR_NAME: &str = "db-tool-dir";

pub const RELEASE_SCRIPTS_DIR_NAME: &str = "releaseScripts";
pub const RELEASE_ARCHIVE_DIR_NAME: &str = "Archive";
pub const RELEASE_SQL_DIR_NAME: &str = "SQL.files";
pub const RELEASE_MANIFEST_FILE_NAME: &str = "Manifest";
pub const RELEASE_README_FILE_NAME: &str = "ReadMe";
pub const RELEASE_WARNING_FILE_NAME: &str = "Warning";

pub const MACROS_DIR_NAME: &str = "macros";
pub const DATABASES_DIR_NAME: &str = "databases";

pub const SCHEMAS_DIR_NAME: &str = "schemas";
pub const SCHEMA_TYPES_DIR_NAME: &str = "types";
pub const SCHEMA_TABLES_DIR_NAME: &str = "tables";
pub const SCHEMA_FUNCS_DIR_NAME: &str = "funcs";
pub const SCHEMA_TRIGGERS_DIR_NAME: &str = "triggers";

/// `base/db-tool-dir`
pub fn dbt_dir(base: &Utf8Path) -> Utf8PathBuf {
    base.join(DBT_DIR_NAME)
}

pub fn base_macros_dir(base: &Utf8Path) -> Utf8PathBuf {
    dbt_dir(base).join(MACROS_DIR_NAME)
}

pub fn base_databases_dir(base: &Utf8Path) -> Utf8PathBuf {
    dbt_dir(base).join(DATABASES_DIR_NAME)
}

pub fn database_dir(base: &Utf8Path, db_name: &str) -> Utf8PathBuf {
    base_databases_dir(base).join(db_name)
}

pub fn schema_base_dir(base: &Utf8Path, db_name: &str) -> Utf8PathBuf {
    database_dir(base, db_name).join(SCHEMAS_DIR_NAME)
}

pub fn schema_dir(base: &Utf8Path, db_name: &str, schema_name: &str) -> Utf8PathBuf {
    schema_base_dir(base, db_name).join(schema_name)
}

pub fn release_base_dir(base: &Utf8Path) -> Utf8PathBuf {
    dbt_dir(base).join(RELEASE_SCRIPTS_DIR_NAME)
}

pub fn release_dir(base: &Utf8Path, release: &str) -> Utf8PathBuf {
    release_base_dir(base).join(release)
}

/// Directory holding the SQL scripts that make up a release.
pub fn release_sql_dir(base: &Utf8Path, release: &str) -> Utf8PathBuf {
    release_dir(base, release).join(RELEASE_SQL_DIR_NAME)
}

pub fn release_manifest_file(base: &Utf8Path, release: &str) -> Utf8PathBuf {
    release_dir(base, release).join(RELEASE_MANIFEST_FILE_NAME)
}

pub fn release_readme_file(base: &Utf8Path, release: &str) -> Utf8PathBuf {
    release_dir(base, release).join(RELEASE_README_FILE_NAME)
}

pub fn release_warning_file(base: &Utf8Path, release: &str) -> Utf8PathBuf {
    release_dir(base, release).join(RELEASE_WARNING_FILE_NAME)
}

/// Named locations that `dbt path` can print.
#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Location {
    Root,
    Macros,
    Databases,
    Database,
    SchemaBase,
    Schema,
    ReleaseBase,
    Release,
    ReleaseSql,
    Manifest,
    Readme,
    Warning,
}

/// Identifiers a [`Location`] may need; which ones are required depends on the location.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identifiers<'a> {
    pub database: Option<&'a str>,
    pub schema: Option<&'a str>,
    pub release: Option<&'a str>,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Root => "root",
            Location::Macros => "macros",
            Location::Databases => "databases",
            Location::Database => "database",
            Location::SchemaBase => "schema-base",
            Location::Schema => "schema",
            Location::ReleaseBase => "release-base",
            Location::Release => "release",
            Location::ReleaseSql => "release-sql",
            Location::Manifest => "manifest",
            Location::Readme => "readme",
            Location::Warning => "warning",
        }
    }

    pub fn resolve(&self, base: &Utf8Path, ids: Identifiers<'_>) -> Result<Utf8PathBuf> {
        let path = match self {
            Location::Root => dbt_dir(base),
            Location::Macros => base_macros_dir(base),
            Location::Databases => base_databases_dir(base),
            Location::Database => database_dir(base, self.require("database", ids.database)?),
            Location::SchemaBase => {
                schema_base_dir(base, self.require("database", ids.database)?)
            }
            Location::Schema => schema_dir(
                base,
                self.require("database", ids.database)?,
                self.require("schema", ids.schema)?,
            ),
            Location::ReleaseBase => release_base_dir(base),
            Location::Release => release_dir(base, self.require("release", ids.release)?),
            Location::ReleaseSql => release_sql_dir(base, self.require("release", ids.release)?),
            Location::Manifest => {
                release_manifest_file(base, self.require("release", ids.release)?)
            }
            Location::Readme => release_readme_file(base, self.require("release", ids.release)?),
            Location::Warning => {
                release_warning_file(base, self.require("release", ids.release)?)
            }
        };
        Ok(path)
    }

    fn require<'a>(&self, what: &str, value: Option<&'a str>) -> Result<&'a str> {
        value.ok_or_else(|| anyhow!("location `{}` needs a {} name", self.as_str(), what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_dir_joins_every_segment() {
        let path = schema_dir(Utf8Path::new("/tmp/proj"), "sales", "public");
        assert_eq!(path, "/tmp/proj/db-tool-dir/databases/sales/schemas/public");
    }

    #[test]
    fn release_files_live_in_release_dir() {
        let base = Utf8Path::new("/srv/app");
        let release = release_dir(base, "R1.2");
        assert_eq!(release, "/srv/app/db-tool-dir/releaseScripts/R1.2");
        assert_eq!(release_sql_dir(base, "R1.2"), release.join("SQL.files"));
        assert_eq!(release_manifest_file(base, "R1.2"), release.join("Manifest"));
        assert_eq!(release_readme_file(base, "R1.2"), release.join("ReadMe"));
        assert_eq!(release_warning_file(base, "R1.2"), release.join("Warning"));
    }

    #[test]
    fn base_dirs() {
        let base = Utf8Path::new("proj");
        assert_eq!(base_macros_dir(base), "proj/db-tool-dir/macros");
        assert_eq!(base_databases_dir(base), "proj/db-tool-dir/databases");
        assert_eq!(release_base_dir(base), "proj/db-tool-dir/releaseScripts");
    }

    #[test]
    fn empty_names_still_produce_a_path() {
        let base = Utf8Path::new("/tmp/proj");
        assert_eq!(
            database_dir(base, ""),
            base_databases_dir(base).join("")
        );
    }

    #[test]
    fn location_reports_missing_identifier() {
        let base = Utf8Path::new("/tmp/proj");
        let err = Location::Schema
            .resolve(
                base,
                Identifiers {
                    database: Some("sales"),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("schema name"));

        let path = Location::Manifest
            .resolve(
                base,
                Identifiers {
                    release: Some("R1"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(path, "/tmp/proj/db-tool-dir/releaseScripts/R1/Manifest");
    }
}
