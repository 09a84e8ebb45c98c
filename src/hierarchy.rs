//! Declarative description of the required directory tree and the two walks
//! over it: one that checks the tree is present and one that creates what is
//! missing.

use std::fs;
use std::io;

use camino::Utf8Path;

use crate::error::{Error, Result};
use crate::layout::{
    self, DATABASES_DIR_NAME, DBT_DIR_NAME, MACROS_DIR_NAME, RELEASE_ARCHIVE_DIR_NAME,
    RELEASE_SCRIPTS_DIR_NAME, SCHEMA_FUNCS_DIR_NAME, SCHEMA_TABLES_DIR_NAME,
    SCHEMA_TRIGGERS_DIR_NAME, SCHEMA_TYPES_DIR_NAME,
};

/// Permission bits for directories we create (rwxr-xr-x).
pub const DIR_MODE: u32 = 0o755;

/// One required directory.
///
/// When `ignore_content` is set only the directory itself is required; its
/// contents belong to the user and `children` must be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirSpec<'a> {
    pub name: &'a str,
    pub ignore_content: bool,
    pub children: &'a [DirSpec<'a>],
}

impl<'a> DirSpec<'a> {
    #[must_use]
    pub const fn new(name: &'a str, children: &'a [DirSpec<'a>]) -> Self {
        Self {
            name,
            ignore_content: false,
            children,
        }
    }

    /// A directory whose contents are not governed by the layout.
    #[must_use]
    pub const fn opaque(name: &'a str) -> Self {
        Self {
            name,
            ignore_content: true,
            children: &[],
        }
    }
}

/// Fixed layout rooted directly under the base directory.
pub const BASE_HIERARCHY: &[DirSpec<'static>] = &[DirSpec::new(
    DBT_DIR_NAME,
    &[
        DirSpec::new(
            RELEASE_SCRIPTS_DIR_NAME,
            &[DirSpec::opaque(RELEASE_ARCHIVE_DIR_NAME)],
        ),
        DirSpec::opaque(MACROS_DIR_NAME),
        DirSpec::opaque(DATABASES_DIR_NAME),
    ],
)];

/// Directories required inside every schema directory.
pub const SCHEMA_HIERARCHY: &[DirSpec<'static>] = &[
    DirSpec::opaque(SCHEMA_TYPES_DIR_NAME),
    DirSpec::opaque(SCHEMA_TABLES_DIR_NAME),
    DirSpec::opaque(SCHEMA_FUNCS_DIR_NAME),
    DirSpec::opaque(SCHEMA_TRIGGERS_DIR_NAME),
];

/// Returns true if every spec, and every descendant of a spec that governs
/// its content, exists under `base` as a directory. Stops at the first miss.
pub fn verify(base: &Utf8Path, specs: &[DirSpec<'_>]) -> bool {
    for spec in specs {
        let dir = base.join(spec.name);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                tracing::debug!("{} exists but is not a directory", dir);
                return false;
            }
            Err(err) => {
                tracing::debug!("{} is not accessible: {}", dir, err);
                return false;
            }
        }

        if spec.ignore_content {
            continue;
        }
        if !verify(&dir, spec.children) {
            return false;
        }
    }
    true
}

/// Creates every missing directory described by `specs` under `base`.
///
/// The first failure aborts the walk and is returned as is; directories
/// created before it are left in place.
pub fn materialize(base: &Utf8Path, specs: &[DirSpec<'_>]) -> Result<()> {
    for spec in specs {
        let dir = base.join(spec.name);
        ensure_dir(&dir)?;

        if !spec.ignore_content {
            materialize(&dir, spec.children)?;
        }
    }
    Ok(())
}

/// Creates `path` (non-recursively) unless a directory is already there.
pub fn ensure_dir(path: &Utf8Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::not_a_directory(path)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => create_dir(path),
        Err(err) => Err(err.into()),
    }
}

fn create_dir(path: &Utf8Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }

    match builder.create(path) {
        Ok(()) => {
            tracing::debug!("created {}", path);
            Ok(())
        }
        // Lost a race with another creator; only a directory counts as success.
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::not_a_directory(path)),
            Err(_) => Err(err.into()),
        },
        Err(err) => Err(err.into()),
    }
}

/// Checks the base layout and, if that is intact, the directories of one schema.
pub fn check_dirs(base: &Utf8Path, db_name: &str, schema_name: &str) -> bool {
    if !verify(base, BASE_HIERARCHY) {
        return false;
    }

    verify(
        &layout::schema_dir(base, db_name, schema_name),
        SCHEMA_HIERARCHY,
    )
}

/// Creates whatever is missing from the base layout and from the tree of the
/// named database and schema.
///
/// This can fail for lack of permission, a full filesystem, or a file sitting
/// where a directory belongs. The attempt stops at the first error.
pub fn make_missing_dirs(base: &Utf8Path, db_name: &str, schema_name: &str) -> Result<()> {
    materialize(base, BASE_HIERARCHY)?;

    ensure_dir(&layout::database_dir(base, db_name))?;
    ensure_dir(&layout::schema_base_dir(base, db_name))?;

    let schema_dir = layout::schema_dir(base, db_name, schema_name);
    ensure_dir(&schema_dir)?;

    materialize(&schema_dir, SCHEMA_HIERARCHY)
}
