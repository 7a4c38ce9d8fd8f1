//! In-memory hive used to exercise the enumerator without a live registry.
//!
//! Paths are matched case-insensitively like the real store, children keep
//! their insertion order, and failures can be injected per key:
//!
//! ```
//! use winsw_registry::{Access, MemoryRegistry, Registry, RegistryKey, Value};
//!
//! let mut reg = MemoryRegistry::new();
//! reg.set_value(r"SOFTWARE\Vendor\{A}", "DisplayName", Value::from("Foo"));
//! let key = reg.open_key(r"software\vendor", Access::ReadAndEnumerate).unwrap();
//! assert_eq!(key.subkey_names().unwrap(), vec!["{A}".to_string()]);
//! ```

use super::{Access, Registry, RegistryKey};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;
use std::rc::Rc;

/// A typed registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Integer(u64),
    Binary(Vec<u8>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(n)
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: Vec<String>,
    values: HashMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    nodes: HashMap<String, Node>,
    denied: HashSet<String>,
    broken_listings: HashSet<String>,
    opened: RefCell<Vec<String>>,
    handles: Rc<Cell<usize>>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('\\').to_ascii_lowercase()
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `path` and any missing ancestors.
    pub fn insert_key(&mut self, path: &str) {
        let mut current = String::new();
        for component in path.trim_matches('\\').split('\\') {
            let parent = normalize(&current);
            if !current.is_empty() {
                current.push('\\');
            }
            current.push_str(component);

            let norm = normalize(&current);
            if self.nodes.contains_key(&norm) {
                continue;
            }
            self.nodes.insert(norm, Node::default());
            if !parent.is_empty() {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.push(component.to_string());
                }
            }
        }
    }

    /// Sets a value, creating the key first if needed.
    pub fn set_value(&mut self, path: &str, name: &str, value: impl Into<Value>) {
        self.insert_key(path);
        if let Some(node) = self.nodes.get_mut(&normalize(path)) {
            node.values.insert(name.to_ascii_lowercase(), value.into());
        }
    }

    /// Makes every open of `path` fail with `PermissionDenied`.
    pub fn deny(&mut self, path: &str) {
        self.denied.insert(normalize(path));
    }

    /// Makes listing the children of `path` fail.
    pub fn break_listing(&mut self, path: &str) {
        self.broken_listings.insert(normalize(path));
    }

    /// Every path passed to `open_key`, in call order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    /// Number of keys currently open.
    pub fn open_handles(&self) -> usize {
        self.handles.get()
    }
}

impl Registry for MemoryRegistry {
    type Key = MemoryKey;

    fn open_key(&self, path: &str, access: Access) -> io::Result<MemoryKey> {
        self.opened.borrow_mut().push(path.to_string());

        let norm = normalize(path);
        if self.denied.contains(&norm) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access denied: {path}"),
            ));
        }
        let node = self.nodes.get(&norm).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("key not found: {path}"))
        })?;

        self.handles.set(self.handles.get() + 1);
        Ok(MemoryKey {
            node: node.clone(),
            access,
            listing_broken: self.broken_listings.contains(&norm),
            handles: Rc::clone(&self.handles),
        })
    }
}

/// Snapshot of a key taken when it was opened.
#[derive(Debug)]
pub struct MemoryKey {
    node: Node,
    access: Access,
    listing_broken: bool,
    handles: Rc<Cell<usize>>,
}

impl MemoryKey {
    fn value(&self, name: &str) -> io::Result<&Value> {
        self.node
            .values
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no value {name}")))
    }
}

impl RegistryKey for MemoryKey {
    fn subkey_names(&self) -> io::Result<Vec<String>> {
        if self.access != Access::ReadAndEnumerate {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "key was not opened for enumeration",
            ));
        }
        if self.listing_broken {
            return Err(io::Error::new(io::ErrorKind::Other, "subkey listing failed"));
        }
        Ok(self.node.children.clone())
    }

    fn string_value(&self, name: &str) -> io::Result<String> {
        match self.value(name)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{name} is not a string value"),
            )),
        }
    }

    fn integer_value(&self, name: &str) -> io::Result<u64> {
        match self.value(name)? {
            Value::Integer(n) => Ok(*n),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{name} is not an integer value"),
            )),
        }
    }
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        self.handles.set(self.handles.get() - 1);
    }
}
