use serde::{Deserialize, Serialize};

/// Field names used on the wire.
pub mod names {
    pub const PAYGATE_ID: &str = "PAYGATE_ID";
    pub const REFERENCE: &str = "REFERENCE";
    pub const AMOUNT: &str = "AMOUNT";
    pub const CURRENCY: &str = "CURRENCY";
    pub const RETURN_URL: &str = "RETURN_URL";
    pub const TRANSACTION_DATE: &str = "TRANSACTION_DATE";
    pub const LOCALE: &str = "LOCALE";
    pub const COUNTRY: &str = "COUNTRY";
    pub const EMAIL: &str = "EMAIL";
    pub const PAY_REQUEST_ID: &str = "PAY_REQUEST_ID";
    pub const TRANSACTION_STATUS: &str = "TRANSACTION_STATUS";
    pub const CHECKSUM: &str = "CHECKSUM";
    pub const ERROR: &str = "ERROR";
}

/// Ordered mapping of field name to string value.
///
/// The gateway signs and transmits fields positionally, so insertion order is
/// preserved. Inserting a name that is already present replaces the value in
/// place without moving the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    entries: Vec<(String, String)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set a field, replacing in place if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Remove a field and return its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Encode as an `application/x-www-form-urlencoded` body, field order
    /// preserved. Names are the plain protocol identifiers; only values are
    /// percent-escaped.
    pub fn to_form_encoded(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.iter() {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(name);
            out.push('=');
            out.push_str(&urlencoding::encode(value));
        }
        out
    }

    /// Parse a URL-encoded body into a FieldSet, keeping the order received.
    /// A bare `name` with no `=` parses as an empty value.
    pub fn from_form_encoded(raw: &str) -> Self {
        let mut fields = FieldSet::new();
        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = match pair.split_once('=') {
                Some((n, v)) => (n, v),
                None => (pair, ""),
            };
            fields.insert(decode_component(name), decode_component(value));
        }
        fields
    }

    /// Render `NAME: value` lines, one per field, order preserved. Used for
    /// the audit trail attached to a confirmed transaction.
    pub fn audit_report(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.iter() {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

impl FromIterator<(String, String)> for FieldSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut fields = FieldSet::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// Decode one form component. `+` means space in form bodies; a component
/// that fails to decode is kept verbatim rather than dropped.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
