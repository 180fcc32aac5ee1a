//! Qualified XML names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a Clark-notation name cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QNameError {
    #[error("qualified name is empty")]
    Empty,

    #[error("unterminated namespace in qualified name: {0}")]
    UnterminatedNamespace(String),

    #[error("qualified name has no local part: {0}")]
    MissingLocalPart(String),
}

/// A namespace-qualified name such as a SOAP fault code.
///
/// Equality and hashing consider only the namespace URI and local part;
/// the prefix is a serialization hint and is not carried by the Clark form.
/// A name with an empty local part does not survive a `Display`/`FromStr`
/// round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QName {
    namespace_uri: String,
    local_part: String,
    prefix: String,
}

impl QName {
    /// Create a name in the given namespace.
    pub fn new(namespace_uri: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_part: local_part.into(),
            prefix: String::new(),
        }
    }

    /// Create a name with no namespace.
    pub fn local(local_part: impl Into<String>) -> Self {
        Self::new(String::new(), local_part)
    }

    /// Attach a preferred prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_part == other.local_part
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace_uri.hash(state);
        self.local_part.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() && !self.local_part.starts_with('{') {
            f.write_str(&self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_part)
        }
    }
}

impl FromStr for QName {
    type Err = QNameError;

    /// Parse `{namespace}local` or a bare `local`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(QNameError::Empty);
        }

        let Some(rest) = s.strip_prefix('{') else {
            return Ok(Self::local(s));
        };

        let (namespace_uri, local_part) = rest
            .split_once('}')
            .ok_or_else(|| QNameError::UnterminatedNamespace(s.to_string()))?;

        if local_part.is_empty() {
            return Err(QNameError::MissingLocalPart(s.to_string()));
        }

        Ok(Self::new(namespace_uri, local_part))
    }
}

impl TryFrom<String> for QName {
    type Error = QNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QName> for String {
    fn from(name: QName) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_clark_notation_display() {
        let name = QName::new("http://example.org", "Server");
        assert_eq!(name.to_string(), "{http://example.org}Server");
        assert_eq!(QName::local("Server").to_string(), "Server");
    }

    #[test]
    fn test_parse_clark_notation() {
        let name: QName = "{http://example.org}Server".parse().unwrap();
        assert_eq!(name.namespace_uri(), "http://example.org");
        assert_eq!(name.local_part(), "Server");

        let bare: QName = "Server".parse().unwrap();
        assert_eq!(bare.namespace_uri(), "");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<QName>(), Err(QNameError::Empty));
        assert!(matches!(
            "{http://example.org".parse::<QName>(),
            Err(QNameError::UnterminatedNamespace(_))
        ));
        assert!(matches!(
            "{http://example.org}".parse::<QName>(),
            Err(QNameError::MissingLocalPart(_))
        ));
    }

    #[test]
    fn test_local_part_with_brace_round_trips() {
        let name = QName::local("{odd");
        assert_eq!(name.to_string(), "{}{odd");

        let parsed: QName = name.to_string().parse().unwrap();
        assert_eq!(parsed, name);
        assert_eq!(parsed.namespace_uri(), "");
    }

    #[test]
    fn test_empty_local_part_does_not_parse_back() {
        assert_eq!(QName::local("").to_string().parse::<QName>(), Err(QNameError::Empty));
        assert!(matches!(
            QName::new("urn:x", "").to_string().parse::<QName>(),
            Err(QNameError::MissingLocalPart(_))
        ));
    }

    #[test]
    fn test_prefix_ignored_by_equality() {
        let a = QName::new("urn:x", "Item").with_prefix("a");
        let b = QName::new("urn:x", "Item").with_prefix("b");
        assert_eq!(a, b);
        assert_eq!(a.prefix(), "a");

        let set: HashSet<QName> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_serde_as_clark_string() {
        let name = QName::new("urn:x", "Item");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"{urn:x}Item\"");

        let parsed: QName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
        assert!(serde_json::from_str::<QName>("\"{urn:x\"").is_err());
    }
}
