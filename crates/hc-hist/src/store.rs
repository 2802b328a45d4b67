//! Named-object store: a JSON document of histograms and profiles.
//!
//! ```json
//! {
//!   "schema_version": "hadrochem_store_v0",
//!   "objects": {
//!     "calibration": { "kind": "histogram", "name": "calibration", ... },
//!     "hPiCent":     { "kind": "profile",   "name": "hPiCent", ... }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::histogram::Histogram;
use crate::profile::Profile;

/// Schema identifier written into every store document.
pub const STORE_SCHEMA_VERSION: &str = "hadrochem_store_v0";

/// An object held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredObject {
    /// 1D histogram.
    Histogram(Histogram),
    /// Profile.
    Profile(Profile),
}

impl StoredObject {
    /// Class name reported by [`ObjectStore::list_keys`].
    pub fn class_name(&self) -> &'static str {
        match self {
            StoredObject::Histogram(_) => "Histogram",
            StoredObject::Profile(_) => "Profile",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            StoredObject::Histogram(h) => h.validate(),
            StoredObject::Profile(p) => p.validate(),
        }
    }
}

/// Name and class of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Store key.
    pub name: String,
    /// `"Histogram"` or `"Profile"`.
    pub class_name: String,
}

/// In-memory view of a store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStore {
    /// Always [`STORE_SCHEMA_VERSION`].
    pub schema_version: String,
    /// Objects by key, in key order.
    pub objects: BTreeMap<String, StoredObject>,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    /// Empty store.
    pub fn new() -> Self {
        Self { schema_version: STORE_SCHEMA_VERSION.to_string(), objects: BTreeMap::new() }
    }

    /// Read a store document from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::InputAbsent(path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;
        let store = Self::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), objects = store.objects.len(), "opened store");
        Ok(store)
    }

    /// Parse and validate a store document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let store: ObjectStore = serde_json::from_slice(bytes)?;
        if store.schema_version != STORE_SCHEMA_VERSION {
            return Err(Error::Validation(format!(
                "unsupported store schema_version: {} (expected {STORE_SCHEMA_VERSION})",
                store.schema_version
            )));
        }
        for (key, obj) in &store.objects {
            obj.validate()?;
            let name = match obj {
                StoredObject::Histogram(h) => &h.name,
                StoredObject::Profile(p) => &p.name,
            };
            if name != key {
                return Err(Error::Validation(format!(
                    "store key '{key}' holds object named '{name}'"
                )));
            }
        }
        Ok(store)
    }

    /// Insert (or replace) a histogram under its own name.
    pub fn insert_histogram(&mut self, h: Histogram) {
        self.objects.insert(h.name.clone(), StoredObject::Histogram(h));
    }

    /// Insert (or replace) a profile under its own name.
    pub fn insert_profile(&mut self, p: Profile) {
        self.objects.insert(p.name.clone(), StoredObject::Profile(p));
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Keys with their class names, in key order.
    pub fn list_keys(&self) -> Vec<KeyInfo> {
        self.objects
            .iter()
            .map(|(name, obj)| KeyInfo { name: name.clone(), class_name: obj.class_name().into() })
            .collect()
    }

    /// Look up a histogram by name.
    pub fn get_histogram(&self, name: &str) -> Result<&Histogram> {
        match self.objects.get(name) {
            Some(StoredObject::Histogram(h)) => Ok(h),
            Some(other) => Err(Error::Validation(format!(
                "object '{name}' is a {}, not a Histogram",
                other.class_name()
            ))),
            None => Err(Error::InputAbsent(format!("histogram '{name}'"))),
        }
    }

    /// Look up a profile by name.
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        match self.objects.get(name) {
            Some(StoredObject::Profile(p)) => Ok(p),
            Some(other) => Err(Error::Validation(format!(
                "object '{name}' is a {}, not a Profile",
                other.class_name()
            ))),
            None => Err(Error::InputAbsent(format!("profile '{name}'"))),
        }
    }

    /// Write the store as pretty JSON, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), objects = self.objects.len(), "wrote store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_kind() {
        let mut store = ObjectStore::new();
        store.insert_histogram(Histogram::new("calibration", "", 4, 0.0, 4.0).unwrap());
        store.insert_profile(Profile::new("hPiCent", "", 10, 0.0, 10.0).unwrap());

        let keys = store.list_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].name, "calibration");
        assert_eq!(keys[0].class_name, "Histogram");
        assert_eq!(keys[1].class_name, "Profile");

        assert!(store.get_histogram("calibration").is_ok());
        assert!(store.get_profile("hPiCent").is_ok());
        assert!(store.get_histogram("missing").unwrap_err().is_input_absent());
        assert!(matches!(store.get_profile("calibration"), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_foreign_schema() {
        let doc = br#"{"schema_version":"other_v1","objects":{}}"#;
        assert!(matches!(ObjectStore::from_slice(doc), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_mismatched_key() {
        let mut store = ObjectStore::new();
        let h = Histogram::new("a", "", 1, 0.0, 1.0).unwrap();
        store.objects.insert("b".into(), StoredObject::Histogram(h));
        let bytes = serde_json::to_vec(&store).unwrap();
        assert!(ObjectStore::from_slice(&bytes).is_err());
    }
}
