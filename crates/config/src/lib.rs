//! # Config - installation metadata and environment defaults
//!
//! Answers "where is this tool installed and how do I link against it"
//! questions for build scripts, and holds the environment-variable defaults
//! shared by the command line tool.
//!
//! Installation directories are baked in at build time, relative to the
//! directory holding the executable, and overridable through environment
//! variables seen by the compiler:
//!
//! ```text
//! RENORMALIZE_LIBDIR      library directory          (default: "../lib")
//! RENORMALIZE_INCLUDEDIR  header directory           (default: "../include")
//! RENORMALIZE_COMPDIR     build-system config dir    (default: "../lib/cmake/renormalize")
//! RENORMALIZE_BINDIR      binary directory           (default: ".")
//! RENORMALIZE_LIBNAME     library name               (default: "renormalize")
//! RENORMALIZE_LDFLAGS     linker flags               (default: "-L<LIBDIR> -lrenormalize")
//! RENORMALIZE_CFLAGS      compiler flags             (default: "-I<INCLUDEDIR>")
//! ```
//!
//! `<LIBDIR>` and `<INCLUDEDIR>` in the flags are replaced by the resolved
//! directories. Resolved paths are only meaningful for an installed binary.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Environment variable overriding the default merged output path.
pub const OUTPUT_ENV: &str = "RENORMALIZE_OUTPUT";
/// Output path used when neither a flag nor [`OUTPUT_ENV`] names one.
pub const DEFAULT_OUTPUT: &str = "combined.mcpl";
/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "RENORMALIZE_LOG";
/// Log filter used when [`LOG_ENV`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

const LIBDIR_PLACEHOLDER: &str = "<LIBDIR>";
const INCLUDEDIR_PLACEHOLDER: &str = "<INCLUDEDIR>";

/// Reads a configuration value from the environment, falling back to `default`.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid choice {0:?}, expected one of: {choices}", choices = Show::CHOICES)]
    InvalidChoice(String),

    #[error("version {0:?} does not start with a number")]
    BadVersion(String),

    #[error("unable to determine executable path: {0}")]
    ExecutablePath(#[from] std::io::Error),
}

/// One piece of installation information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    LibDir,
    IncludeDir,
    CompDir,
    LibName,
    Version,
    BinDir,
    LdFlags,
    CFlags,
}

impl Show {
    pub const ALL: [Show; 8] = [
        Show::LibDir,
        Show::IncludeDir,
        Show::CompDir,
        Show::LibName,
        Show::Version,
        Show::BinDir,
        Show::LdFlags,
        Show::CFlags,
    ];

    /// Comma separated list of accepted names, for help texts.
    pub const CHOICES: &'static str =
        "libdir, includedir, compdir, libname, version, bindir, ldflags, cflags";

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Show::LibDir => "libdir",
            Show::IncludeDir => "includedir",
            Show::CompDir => "compdir",
            Show::LibName => "libname",
            Show::Version => "version",
            Show::BinDir => "bindir",
            Show::LdFlags => "ldflags",
            Show::CFlags => "cflags",
        }
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive.
impl FromStr for Show {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Show::ALL
            .into_iter()
            .find(|choice| choice.name() == wanted)
            .ok_or_else(|| ConfigError::InvalidChoice(s.to_string()))
    }
}

/// Raw installation values, before path resolution and placeholder
/// substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub libdir: String,
    pub includedir: String,
    pub compdir: String,
    pub libname: String,
    pub version: String,
    pub bindir: String,
    pub ldflags: String,
    pub cflags: String,
}

impl Default for Installation {
    /// The values this binary was built with.
    fn default() -> Self {
        Self {
            libdir: option_env!("RENORMALIZE_LIBDIR").unwrap_or("../lib").to_string(),
            includedir: option_env!("RENORMALIZE_INCLUDEDIR")
                .unwrap_or("../include")
                .to_string(),
            compdir: option_env!("RENORMALIZE_COMPDIR")
                .unwrap_or("../lib/cmake/renormalize")
                .to_string(),
            libname: option_env!("RENORMALIZE_LIBNAME")
                .unwrap_or("renormalize")
                .to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bindir: option_env!("RENORMALIZE_BINDIR").unwrap_or(".").to_string(),
            ldflags: option_env!("RENORMALIZE_LDFLAGS")
                .unwrap_or("-L<LIBDIR> -lrenormalize")
                .to_string(),
            cflags: option_env!("RENORMALIZE_CFLAGS")
                .unwrap_or("-I<INCLUDEDIR>")
                .to_string(),
        }
    }
}

impl Installation {
    /// The stored value for `choice`, unresolved.
    #[must_use]
    pub fn raw(&self, choice: Show) -> &str {
        match choice {
            Show::LibDir => &self.libdir,
            Show::IncludeDir => &self.includedir,
            Show::CompDir => &self.compdir,
            Show::LibName => &self.libname,
            Show::Version => &self.version,
            Show::BinDir => &self.bindir,
            Show::LdFlags => &self.ldflags,
            Show::CFlags => &self.cflags,
        }
    }

    /// Resolves `choice` for an executable living in `exe_dir`.
    ///
    /// Directories are joined onto `exe_dir`; flags get their placeholders
    /// replaced by the resolved directories; names are returned as stored.
    #[must_use]
    pub fn lookup(&self, choice: Show, exe_dir: &Path) -> String {
        match choice {
            Show::LibName | Show::Version => self.raw(choice).to_string(),
            Show::LdFlags => self.ldflags.replace(
                LIBDIR_PLACEHOLDER,
                &self.lookup(Show::LibDir, exe_dir),
            ),
            Show::CFlags => self.cflags.replace(
                INCLUDEDIR_PLACEHOLDER,
                &self.lookup(Show::IncludeDir, exe_dir),
            ),
            Show::LibDir | Show::IncludeDir | Show::CompDir | Show::BinDir => {
                installation_path(exe_dir, self.raw(choice))
                    .display()
                    .to_string()
            }
        }
    }

    /// [`version_integer`] of this installation's version.
    pub fn version_integer(&self) -> Result<u64, ConfigError> {
        version_integer(&self.version)
    }
}

/// Directory containing the running executable, with symlinks resolved.
pub fn executable_dir() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe()?.canonicalize()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}

/// Joins `relative` onto `base` and normalizes the result.
///
/// Existing paths are canonicalized; paths that do not exist (yet) are
/// normalized lexically, so `bin/../lib` becomes `lib` either way.
#[must_use]
pub fn installation_path(base: &Path, relative: &str) -> PathBuf {
    let joined = base.join(relative);
    joined
        .canonicalize()
        .unwrap_or_else(|_| normalize_lexically(&joined))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root; a leading `..` of a
                // relative path is kept.
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Packs a dotted version into an integer, two decimal digits per
/// component: `"1.2.3"` gives `10203`.
///
/// At most three components are used. Parsing stops at the first missing
/// component, so `"1.2"` gives `102`. Within a component only the leading
/// digits count, so `"1.2.3-rc1"` still gives `10203`.
pub fn version_integer(version: &str) -> Result<u64, ConfigError> {
    let mut result = 0u64;
    for (i, component) in version.split('.').take(3).enumerate() {
        let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
        let value: u64 = match digits.parse() {
            Ok(value) => value,
            // Only the leading component has to be numeric.
            Err(_) if i > 0 => 0,
            Err(_) => return Err(ConfigError::BadVersion(version.to_string())),
        };
        result = result * 100 + value;
    }
    Ok(result)
}

#[cfg(test)]
mod tests;
