//! Field-level input rules shared by the branch forms and the parcel form.
//!
//! Rules are pure: they return the message to show, and the caller decides
//! where to store it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SRI_LANKAN_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+94|0)[1-9][0-9]{8}$").expect("phone pattern is valid")
});

const LOCATION_MIN: usize = 2;
const LOCATION_MAX: usize = 100;

/// Check `value` against the rule registered for `name`.
///
/// Returns `None` when the value is valid or when no rule exists for `name`.
pub fn validate_field(name: &str, value: &str) -> Option<String> {
    match name {
        "location" => validate_location(value),
        "contact" => validate_contact(value),
        _ => None,
    }
}

fn validate_location(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some("Location is required".to_string());
    }
    let len = value.chars().count();
    if len < LOCATION_MIN {
        return Some(format!("Location must be at least {LOCATION_MIN} characters"));
    }
    if len > LOCATION_MAX {
        return Some(format!("Location must not exceed {LOCATION_MAX} characters"));
    }
    if !value.chars().all(is_location_char) {
        return Some("Location contains invalid characters".to_string());
    }
    None
}

fn is_location_char(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, ' ' | '-' | ',' | '.' | '\'' | '(' | ')')
}

fn validate_contact(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some("Contact number is required".to_string());
    }
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if !SRI_LANKAN_PHONE.is_match(&compact) {
        return Some("Please enter a valid Sri Lankan phone number".to_string());
    }
    None
}

/// Current validation message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a failed result, or clear the field when it re-validates.
    pub fn record(&mut self, field: &str, outcome: Option<String>) {
        match outcome {
            Some(msg) => {
                self.0.insert(field.to_string(), msg);
            }
            None => {
                self.0.remove(field);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Input of the branch create and update forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchForm {
    pub location: String,
    pub contact: String,
}

impl BranchForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.record("location", validate_field("location", &self.location));
        errors.record("contact", validate_field("contact", &self.contact));
        errors
    }
}
