use super::{Access, Registry, RegistryKey};
use std::io;
use winreg::enums::*;
use winreg::types::FromRegValue;
use winreg::RegKey;

/// The live `HKEY_LOCAL_MACHINE` hive.
pub struct WindowsRegistry {
    root: RegKey,
}

impl WindowsRegistry {
    pub fn new() -> Self {
        WindowsRegistry {
            root: RegKey::predef(HKEY_LOCAL_MACHINE),
        }
    }
}

impl Default for WindowsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for WindowsRegistry {
    type Key = RegKey;

    fn open_key(&self, path: &str, access: Access) -> io::Result<RegKey> {
        // Wow6432Node is addressed explicitly, so never let WOW64 redirect us.
        let flags = match access {
            Access::ReadAndEnumerate => KEY_QUERY_VALUE | KEY_ENUMERATE_SUB_KEYS,
            Access::Read => KEY_QUERY_VALUE,
        } | KEY_WOW64_64KEY;
        self.root.open_subkey_with_flags(path, flags)
    }
}

impl RegistryKey for RegKey {
    fn subkey_names(&self) -> io::Result<Vec<String>> {
        self.enum_keys().collect()
    }

    fn string_value(&self, name: &str) -> io::Result<String> {
        let raw = self.get_raw_value(name)?;
        match raw.vtype {
            REG_SZ | REG_EXPAND_SZ => String::from_reg_value(&raw),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{name} is not a string value"),
            )),
        }
    }

    fn integer_value(&self, name: &str) -> io::Result<u64> {
        let raw = self.get_raw_value(name)?;
        match raw.vtype {
            REG_DWORD => u32::from_reg_value(&raw).map(u64::from),
            REG_QWORD => u64::from_reg_value(&raw),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{name} is not an integer value"),
            )),
        }
    }
}
