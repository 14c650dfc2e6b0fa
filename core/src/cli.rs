//! Program roots built from package metadata.
//!
//! A program root is an ordinary [`Command`] named after the running
//! executable, with its version and description taken from explicit options
//! or from a package manifest.
//!
//! # Example
//!
//! ```
//! use command_pipe_core::{CliOptions, PackageMetadata, program};
//!
//! let root = program(CliOptions {
//!     name: Some("tool".into()),
//!     package: Some(PackageMetadata::from_json(
//!         r#"{"name": "tool", "version": "0.4.0", "description": "Does things"}"#,
//!     ).unwrap()),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! assert_eq!(root.name(), "tool");
//! assert_eq!(root.version(), Some("0.4.0"));
//! assert_eq!(root.description(), Some("Does things"));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::{Command, DEBUG_FLAG};
use crate::error::{MetadataError, Result};
use crate::flag::{BUILTIN_FLAG_ORDER, Flag, FlagOptions};

/// Fields read from a package manifest. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PackageMetadata {
    /// Parses a JSON manifest.
    pub fn from_json(raw: &str) -> std::result::Result<Self, MetadataError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a JSON manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Io`] if the file cannot be read and
    /// [`MetadataError::Json`] if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, MetadataError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// Builds [`PackageMetadata`] from the calling crate's cargo metadata.
///
/// ```
/// let metadata = command_pipe_core::package_metadata!();
/// assert_eq!(metadata.name.as_deref(), Some(env!("CARGO_PKG_NAME")));
/// ```
#[macro_export]
macro_rules! package_metadata {
    () => {
        $crate::PackageMetadata {
            name: Some(env!("CARGO_PKG_NAME").to_string()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            description: Some(env!("CARGO_PKG_DESCRIPTION").to_string())
                .filter(|d| !d.is_empty()),
        }
    };
}

/// Settings for a program root. Explicit fields win over `package`.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub package: Option<PackageMetadata>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// Builds the root command of a program.
///
/// The root also declares `--cli-debug` so full error traces can be
/// requested under strict parsing.
pub fn program(options: CliOptions) -> Result<Command> {
    let package = options.package.unwrap_or_default();
    let name = options
        .name
        .or_else(program_name)
        .or(package.name)
        .unwrap_or_else(|| "cli".to_string());

    let mut root = Command::new(&name)?.with_flag(Flag::with_options(
        &format!("--{DEBUG_FLAG}"),
        FlagOptions {
            desc: Some("print full error traces".to_string()),
            order: Some(BUILTIN_FLAG_ORDER),
        },
    )?);
    if let Some(version) = options.version.or(package.version) {
        root = root.with_version(&version);
    }
    if let Some(description) = options.description.or(package.description) {
        root = root.with_description(&description);
    }
    Ok(root)
}

/// File stem of the running executable, falling back to `argv[0]`.
pub fn program_name() -> Option<String> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| stem(&exe))
        .or_else(|| std::env::args_os().next().and_then(|arg0| stem(Path::new(&arg0))))
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}
