use std::io;

pub mod memory;
#[cfg(windows)]
pub mod windows;

pub use memory::{MemoryRegistry, Value};
#[cfg(windows)]
pub use windows::WindowsRegistry;

/// Access requested when opening a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Query values and enumerate subkeys.
    ReadAndEnumerate,
    /// Query values only.
    Read,
}

/// Read-only view of a registry hive. Paths are backslash separated and
/// relative to the hive root.
pub trait Registry {
    type Key: RegistryKey;

    fn open_key(&self, path: &str, access: Access) -> io::Result<Self::Key>;
}

/// An open key. The handle is released when the value is dropped.
pub trait RegistryKey {
    /// Names of the immediate child keys, in the order the store reports them.
    fn subkey_names(&self) -> io::Result<Vec<String>>;

    fn string_value(&self, name: &str) -> io::Result<String>;

    fn integer_value(&self, name: &str) -> io::Result<u64>;
}
