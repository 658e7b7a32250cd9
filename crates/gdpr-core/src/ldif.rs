//! LDIF rendering of account profiles.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use gdpr_common::{Account, ProfileFormatter};
use std::fmt::Write as _;

/// Renders an account as a single LDIF entry.
///
/// ```text
/// dn: uid=jdoe,ou=users,dc=georchestra,dc=org
/// cn: John Doe
/// mail: jdoe@example.org
/// ```
///
/// Attributes appear in name order, values in stored order. Values that
/// are not safe LDIF strings are written base64 encoded (`attr:: ...`).
#[derive(Debug, Clone)]
pub struct LdifFormatter {
    base_dn: String,
}

impl LdifFormatter {
    pub fn new(base_dn: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
        }
    }

    pub fn dn(&self, account: &Account) -> String {
        if self.base_dn.is_empty() {
            format!("uid={}", account.uid)
        } else {
            format!("uid={},{}", account.uid, self.base_dn)
        }
    }

    pub fn to_ldif(&self, account: &Account) -> String {
        let mut out = String::new();
        push_line(&mut out, "dn", &self.dn(account));
        for (name, values) in &account.attributes {
            for value in values {
                push_line(&mut out, name, value);
            }
        }
        out
    }
}

impl Default for LdifFormatter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BASE_DN)
    }
}

impl ProfileFormatter for LdifFormatter {
    fn render(&self, account: &Account) -> gdpr_common::Result<String> {
        Ok(self.to_ldif(account))
    }
}

fn push_line(out: &mut String, name: &str, value: &str) {
    // writing to a String cannot fail
    let _ = if is_safe_string(value) {
        writeln!(out, "{}: {}", name, value)
    } else {
        writeln!(out, "{}:: {}", name, STANDARD.encode(value))
    };
}

/// RFC 2849 SAFE-STRING, additionally rejecting a trailing space.
fn is_safe_string(value: &str) -> bool {
    let bytes = value.as_bytes();
    let Some(&first) = bytes.first() else {
        return true;
    };
    if matches!(first, b' ' | b':' | b'<') || bytes.last() == Some(&b' ') {
        return false;
    }
    bytes
        .iter()
        .all(|&b| b.is_ascii() && !matches!(b, b'\0' | b'\n' | b'\r'))
}
