//! Short module name to FQCN lookup table.
//!
//! The table is built once (bundled data, a mapping file, or both plus
//! overrides) and shared read-only by the converter, the validator and every
//! batch worker.
//!
//! Two file shapes are accepted:
//!
//! ```yaml
//! # flat
//! fqcn_mappings:
//!   copy: ansible.builtin.copy
//!
//! # collection-namespaced
//! ansible_builtin:
//!   copy: ansible.builtin.copy
//! community_general:
//!   ufw: community.general.ufw
//! ```

mod fqcn;

pub use fqcn::{Fqcn, FqcnParseError};

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Mapping data shipped with the crate.
const BUNDLED_MAPPINGS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/mappings/fqcn_mapping.yml"
));

/// Top-level key of the flat mapping file shape.
const FLAT_SECTION: &str = "fqcn_mappings";

/// Collections recognised even when no table entry points into them.
const ALWAYS_KNOWN_COLLECTIONS: &[&str] = &["ansible.builtin", "ansible.legacy"];

/// Immutable short-name to FQCN lookup table.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: IndexMap<String, String>,
    collections: BTreeSet<String>,
}

impl MappingTable {
    /// Creates a table with no entries.
    pub fn empty() -> Self {
        let mut table = Self::default();
        table.reindex_collections();
        table
    }

    /// Loads the bundled mapping data.
    ///
    /// Falls back to an empty table if the embedded data cannot be loaded.
    pub fn bundled() -> Self {
        match Self::from_yaml_str(BUNDLED_MAPPINGS, "bundled mappings") {
            Ok(table) => table,
            Err(e) => {
                warn!("Falling back to an empty mapping table: {}", e);
                Self::empty()
            }
        }
    }

    /// Loads a mapping file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::file_access(path, e))?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Loads a mapping file, degrading to an empty table on any failure.
    pub fn from_file_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    "Mapping file '{}' unusable, continuing with an empty table: {}",
                    path.display(),
                    e
                );
                Self::empty()
            }
        }
    }

    /// Parses mapping YAML in either the flat or the namespaced shape.
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(content)
            .map_err(|e| Error::configuration(format!("{}: {}", origin, e)))?;

        let root = doc.as_mapping().ok_or_else(|| {
            Error::configuration(format!("{}: expected a mapping at the top level", origin))
        })?;

        let mut table = Self::default();
        let mut sections = 0usize;

        if let Some(flat) = root.get(FLAT_SECTION) {
            let flat = flat.as_mapping().ok_or_else(|| {
                Error::configuration(format!("{}: '{}' must be a mapping", origin, FLAT_SECTION))
            })?;
            table.load_section(FLAT_SECTION, flat, origin)?;
            sections += 1;
        } else {
            for (key, value) in root {
                let Some(section) = value.as_mapping() else {
                    // scalar metadata such as `version`
                    continue;
                };
                let name = key.as_str().unwrap_or("<non-string section>");
                table.load_section(name, section, origin)?;
                sections += 1;
            }
        }

        if sections == 0 {
            return Err(Error::configuration(format!(
                "{}: no '{}' section or collection sections found",
                origin, FLAT_SECTION
            )));
        }

        table.reindex_collections();
        debug!("Loaded {} module mappings from {}", table.len(), origin);
        Ok(table)
    }

    fn load_section(&mut self, section: &str, map: &serde_yaml::Mapping, origin: &str) -> Result<()> {
        for (key, value) in map {
            let (Some(short), Some(fqcn)) = (key.as_str(), value.as_str()) else {
                return Err(Error::configuration(format!(
                    "{}: section '{}' must map module names to FQCN strings",
                    origin, section
                )));
            };
            self.insert_checked(short, fqcn)
                .map_err(|e| Error::configuration(format!("{}: {}", origin, e)))?;
        }
        Ok(())
    }

    fn insert_checked(&mut self, short: &str, fqcn: &str) -> Result<()> {
        let short = short.trim();
        if short.is_empty() {
            return Err(Error::configuration("empty module name in mapping"));
        }
        let parsed = Fqcn::parse(fqcn).map_err(|e| {
            Error::configuration(format!("invalid FQCN for '{}': {}", short, e))
        })?;
        self.entries.insert(short.to_string(), parsed.to_string());
        Ok(())
    }

    /// Returns a copy of this table with `overrides` applied.
    ///
    /// An override replaces an existing entry with the same short name.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (short, fqcn) in overrides {
            self.insert_checked(short.as_ref(), fqcn.as_ref())?;
        }
        self.reindex_collections();
        Ok(self)
    }

    fn reindex_collections(&mut self) {
        self.collections = ALWAYS_KNOWN_COLLECTIONS
            .iter()
            .map(|c| c.to_string())
            .chain(self.entries.values().filter_map(|fqcn| {
                fqcn.rsplit_once('.').map(|(collection, _)| collection.to_string())
            }))
            .collect();
    }

    /// Resolves a short module name.
    pub fn lookup(&self, short: &str) -> Option<&str> {
        self.entries.get(short).map(String::as_str)
    }

    /// Returns true if the short name has an entry.
    pub fn contains(&self, short: &str) -> bool {
        self.entries.contains_key(short)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Recognised `namespace.collection` prefixes.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(String::as_str)
    }

    /// Returns true if `fqcn` belongs to a recognised collection.
    pub fn is_known_collection(&self, fqcn: &Fqcn) -> bool {
        self.collections.contains(&fqcn.collection_fqn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_loads() {
        let table = MappingTable::bundled();
        assert!(!table.is_empty());
        assert_eq!(table.lookup("copy"), Some("ansible.builtin.copy"));
        assert_eq!(table.lookup("ufw"), Some("community.general.ufw"));
        assert_eq!(table.lookup("mount"), Some("ansible.posix.mount"));
        assert!(!table.contains("include_tasks"));
    }

    #[test]
    fn test_bundled_values_are_fqcn() {
        let table = MappingTable::bundled();
        for (short, fqcn) in table.iter() {
            assert!(Fqcn::is_fqcn(fqcn), "{} -> {}", short, fqcn);
        }
    }

    #[test]
    fn test_flat_shape() {
        let table = MappingTable::from_yaml_str(
            "fqcn_mappings:\n  copy: ansible.builtin.copy\n  foo: acme.tools.foo\n",
            "test",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("foo"), Some("acme.tools.foo"));
    }

    #[test]
    fn test_namespaced_shape_ignores_scalars() {
        let table = MappingTable::from_yaml_str(
            "version: 2\nacme:\n  foo: acme.tools.foo\nother:\n  bar: other.things.bar\n",
            "test",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.collections().any(|c| c == "acme.tools"));
    }

    #[test]
    fn test_invalid_value_is_configuration_error() {
        let err = MappingTable::from_yaml_str("fqcn_mappings:\n  copy: builtin.copy\n", "test")
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(err.to_string().contains("copy"));
    }

    #[test]
    fn test_missing_sections_is_configuration_error() {
        let err = MappingTable::from_yaml_str("version: 1\n", "test").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(MappingTable::from_yaml_str("- a\n- b\n", "test").is_err());
    }

    #[test]
    fn test_overrides_replace_by_key() {
        let table = MappingTable::bundled()
            .with_overrides([("copy", "acme.files.copy"), ("thing", "acme.misc.thing")])
            .unwrap();
        assert_eq!(table.lookup("copy"), Some("acme.files.copy"));
        assert_eq!(table.lookup("thing"), Some("acme.misc.thing"));
        assert!(table.is_known_collection(&Fqcn::new("acme", "files", "x")));
    }

    #[test]
    fn test_override_rejects_bad_fqcn() {
        assert!(MappingTable::empty().with_overrides([("x", "nope")]).is_err());
    }

    #[test]
    fn test_from_file_or_empty_degrades() {
        let table = MappingTable::from_file_or_empty("/definitely/not/here.yml");
        assert!(table.is_empty());
        assert!(table.is_known_collection(&Fqcn::new("ansible", "builtin", "copy")));
    }
}
