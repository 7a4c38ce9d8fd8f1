use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

pub mod inventory;
pub mod registry;

pub use inventory::{installed_software_list, parse_install_date, software_list};
#[cfg(windows)]
pub use inventory::installed_software;
pub use registry::{Access, MemoryRegistry, Registry, RegistryKey, Value};
#[cfg(windows)]
pub use registry::WindowsRegistry;

/// Uninstall key of the native 64-bit software view.
pub const UNINSTALL_X64: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
/// Uninstall key of the 32-bit compatibility view.
pub const UNINSTALL_X32: &str = r"SOFTWARE\Wow6432Node\Microsoft\Windows\CurrentVersion\Uninstall";

/// Which registry view a record was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    X64,
    X32,
}

impl Arch {
    /// Uninstall key enumerated for this view.
    pub fn base_path(self) -> &'static str {
        match self {
            Arch::X64 => UNINSTALL_X64,
            Arch::X32 => UNINSTALL_X32,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X64 => f.write_str("X64"),
            Arch::X32 => f.write_str("X32"),
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("x64") {
            Ok(Arch::X64)
        } else if s.eq_ignore_ascii_case("x32") {
            Ok(Arch::X32)
        } else {
            Err(format!("unknown architecture view: {s}"))
        }
    }
}

/// One installed program, projected from a subkey of an Uninstall key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareRecord {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<NaiveDate>,
    /// Size in KiB as reported by the installer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_major: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_minor: Option<u64>,
    pub arch: Arch,
}

impl SoftwareRecord {
    /// A record with only the mandatory fields set.
    pub fn new(display_name: impl Into<String>, arch: Arch) -> Self {
        SoftwareRecord {
            display_name: display_name.into(),
            display_version: None,
            publisher: None,
            install_date: None,
            estimated_size: None,
            contact: None,
            help_link: None,
            install_source: None,
            install_location: None,
            uninstall_string: None,
            version_major: None,
            version_minor: None,
            arch,
        }
    }
}

/// Failure to reach a key while enumerating. Missing or malformed values
/// never produce one of these.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("error reading from registry key {path}: {source}")]
    OpenKey {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("error reading subkey list of {path}: {source}")]
    ListSubkeys {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("error reading from registry key {path} (subkey {subkey}): {source}")]
    OpenSubkey {
        path: String,
        subkey: String,
        #[source]
        source: io::Error,
    },
}

impl AccessError {
    /// Path of the base key the failing operation was working under.
    pub fn path(&self) -> &str {
        match self {
            AccessError::OpenKey { path, .. }
            | AccessError::ListSubkeys { path, .. }
            | AccessError::OpenSubkey { path, .. } => path,
        }
    }

    pub fn io_error(&self) -> &io::Error {
        match self {
            AccessError::OpenKey { source, .. }
            | AccessError::ListSubkeys { source, .. }
            | AccessError::OpenSubkey { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_text_form() {
        assert_eq!(Arch::X64.to_string(), "X64");
        assert_eq!(Arch::X32.to_string(), "X32");
        assert_eq!("x32".parse::<Arch>(), Ok(Arch::X32));
        assert_eq!("X64".parse::<Arch>(), Ok(Arch::X64));
        assert!("arm64".parse::<Arch>().is_err());
    }

    #[test]
    fn arch_base_paths() {
        assert_eq!(Arch::X64.base_path(), UNINSTALL_X64);
        assert!(Arch::X32.base_path().contains("Wow6432Node"));
    }

    #[test]
    fn access_error_message_names_subkey() {
        let err = AccessError::OpenSubkey {
            path: UNINSTALL_X64.to_string(),
            subkey: "{A}".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains(UNINSTALL_X64));
        assert!(msg.contains("subkey {A}"));
        assert_eq!(err.path(), UNINSTALL_X64);
        assert_eq!(err.io_error().kind(), io::ErrorKind::PermissionDenied);
    }
}
