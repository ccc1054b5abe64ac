//! Build labels (`//package:name`)

use crate::error::{PlzError, PlzResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a single build target within the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildLabel {
    /// Package path relative to the repo root, without leading slashes
    pub package: String,
    /// Target name within the package
    pub name: String,
}

impl BuildLabel {
    /// Create a label from already validated parts
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Parse a label of the form `//pkg:name` or `//pkg`
    pub fn parse(s: &str) -> PlzResult<Self> {
        let rest = s
            .strip_prefix("//")
            .ok_or_else(|| PlzError::invalid_label(s, "must start with //"))?;

        let (package, name) = match rest.split_once(':') {
            Some((pkg, name)) => (pkg, name.to_string()),
            None => {
                let last = rest.rsplit('/').next().unwrap_or_default();
                (rest, last.to_string())
            }
        };

        let label = Self::new(package, name);
        label.validate()?;
        Ok(label)
    }

    /// Check that the package and name are usable as path components
    ///
    /// Both end up joined onto output and cache roots, so neither may be
    /// absolute or step outside them. `parse` always validates; labels made
    /// with `new` should be validated before use.
    pub fn validate(&self) -> PlzResult<()> {
        let invalid = |reason: &str| PlzError::invalid_label(self.to_string(), reason);
        let (package, name) = (self.package.as_str(), self.name.as_str());

        if package.starts_with('/') {
            return Err(invalid("package must be relative to the repo root"));
        }
        if !package.is_empty() {
            for part in package.split('/') {
                match part {
                    "" => return Err(invalid("empty package path component")),
                    "." | ".." => return Err(invalid("package may not contain . or ..")),
                    _ if part.contains('\\') => return Err(invalid("invalid character in package")),
                    _ => {}
                }
            }
        }
        if name.is_empty() {
            return Err(invalid("missing target name"));
        }
        if name == "." || name == ".." {
            return Err(invalid("target name may not be . or .."));
        }
        if name.contains(['/', '\\', ':']) || name.chars().any(char::is_whitespace) {
            return Err(invalid("invalid character in target name"));
        }
        Ok(())
    }

    /// The label this one is derived from
    ///
    /// Subtargets are named `_name#tag` and belong to `name`; every other
    /// label is its own parent.
    pub fn parent(&self) -> BuildLabel {
        match (self.name.starts_with('_'), self.name.find('#')) {
            (true, Some(idx)) => {
                Self::new(self.package.clone(), self.name[..idx].trim_start_matches('_'))
            }
            _ => self.clone(),
        }
    }

    /// Whether this label is a generated subtarget of another
    pub fn is_subtarget(&self) -> bool {
        self.parent() != *self
    }
}

impl fmt::Display for BuildLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.package, self.name)
    }
}

impl FromStr for BuildLabel {
    type Err = PlzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BuildLabel {
    type Error = PlzError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<BuildLabel> for String {
    fn from(label: BuildLabel) -> Self {
        label.to_string()
    }
}
