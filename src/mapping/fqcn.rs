//! Fully Qualified Collection Name (FQCN) parsing
//!
//! FQCNs are the standard way to reference modules in Ansible 2.10+.
//! They follow the format: `namespace.collection.module`
//!
//! # Examples
//!
//! - `ansible.builtin.copy` - The copy module from ansible.builtin
//! - `community.general.ufw` - The ufw module from community.general
//! - `ansible.posix.mount` - The mount module from ansible.posix

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing an FQCN
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FqcnParseError {
    #[error("FQCN must have exactly 3 dot-separated parts (namespace.collection.module): got '{0}'")]
    WrongPartCount(String),

    #[error("FQCN '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("Empty FQCN")]
    Empty,
}

/// A three-segment module reference such as `ansible.builtin.copy`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fqcn {
    /// The namespace (e.g., "ansible", "community")
    pub namespace: String,

    /// The collection name (e.g., "builtin", "general")
    pub collection: String,

    /// The module name (e.g., "copy", "ufw")
    pub module: String,
}

impl Fqcn {
    /// Creates a new FQCN from components
    pub fn new(
        namespace: impl Into<String>,
        collection: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            collection: collection.into(),
            module: module.into(),
        }
    }

    /// Parses an FQCN from a string
    ///
    /// ```rust
    /// use fqcn_converter::mapping::Fqcn;
    ///
    /// let fqcn = Fqcn::parse("ansible.builtin.copy").unwrap();
    /// assert_eq!(fqcn.namespace, "ansible");
    /// assert_eq!(fqcn.module, "copy");
    /// ```
    pub fn parse(s: &str) -> Result<Self, FqcnParseError> {
        s.parse()
    }

    /// Returns true when `s` has the FQCN shape: two dots, three non-empty segments.
    pub fn is_fqcn(s: &str) -> bool {
        let mut parts = s.split('.');
        matches!(
            (parts.next(), parts.next(), parts.next(), parts.next()),
            (Some(a), Some(b), Some(c), None) if !a.is_empty() && !b.is_empty() && !c.is_empty()
        )
    }

    /// Returns the collection part (namespace.collection)
    pub fn collection_fqn(&self) -> String {
        format!("{}.{}", self.namespace, self.collection)
    }

    /// Checks if this FQCN is from the ansible.builtin collection
    pub fn is_builtin(&self) -> bool {
        self.namespace == "ansible" && self.collection == "builtin"
    }
}

impl FromStr for Fqcn {
    type Err = FqcnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(FqcnParseError::Empty);
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(FqcnParseError::WrongPartCount(s.to_string()));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(FqcnParseError::EmptySegment(s.to_string()));
        }

        Ok(Fqcn::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Fqcn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.collection, self.module)
    }
}
