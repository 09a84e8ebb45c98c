//! On-disk layout management for database change scripts.
//!
//! [`layout`] names every well-known location under a base directory and
//! [`hierarchy`] checks or creates the required directory tree.

pub mod cli;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod logging;
pub mod runner;
pub mod sql;
mod templates;

pub use error::{Error, Result};
pub use hierarchy::{
    BASE_HIERARCHY, DirSpec, SCHEMA_HIERARCHY, check_dirs, ensure_dir, make_missing_dirs,
    materialize, verify,
};
