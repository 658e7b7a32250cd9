//! Account identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A user account as resolved from the directory.
///
/// The `uid` is the key for every record query and seeds the name of the
/// staging directory. The remaining directory attributes are only used to
/// render the profile file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable unique identifier.
    pub uid: String,

    /// Directory attributes, multi-valued, keyed by attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl Account {
    /// Create an account with no attributes.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a value to an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of an attribute, if any.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_attributes() {
        let account = Account::new("jdoe")
            .with_attribute("mail", "jdoe@example.org")
            .with_attribute("mail", "john@example.org")
            .with_attribute("cn", "John Doe");

        assert_eq!(account.uid, "jdoe");
        assert_eq!(account.attribute("mail"), Some("jdoe@example.org"));
        assert_eq!(account.attributes["mail"].len(), 2);
        assert_eq!(account.attribute("sn"), None);
        assert_eq!(account.to_string(), "jdoe");
    }

    #[test]
    fn test_account_deserialize_without_attributes() {
        let account: Account = serde_json::from_str(r#"{"uid":"jdoe"}"#).unwrap();
        assert_eq!(account, Account::new("jdoe"));
    }
}
