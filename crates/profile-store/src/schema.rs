use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Value};

use crate::errors::ProfileError;

/// Key the profile lives under inside the persisted envelope.
pub const STORAGE_KEY: &str = "formFuseProfile";

/// Demographic sentinel used when the applicant gave no answer.
pub const PREFER_NOT_TO_SAY: &str = "prefer_not_to_say";

pub const DEFAULT_COUNTRY: &str = "United States";

/// Every attribute the engine knows about, in canonical order.
pub const CANONICAL_PATHS: &[&str] = &[
    "identity.full_name",
    "identity.first_name",
    "identity.last_name",
    "identity.email",
    "identity.phone",
    "address.street",
    "address.city",
    "address.state",
    "address.zip",
    "address.country",
    "work_auth.eligible_to_work_us",
    "work_auth.requires_sponsorship",
    "work_auth.open_to_relocate",
    "work_auth.worked_here_before",
    "demographics.gender",
    "demographics.pronouns",
    "demographics.ethnicity",
    "demographics.disability_status",
    "demographics.veteran_status",
    "education.school",
    "education.degree",
    "education.field_of_study",
    "links.linkedin",
    "links.github",
    "links.portfolio",
    "links.website",
];

/// Sanitized, read-only view of the applicant profile.
///
/// Invariant: holds exactly one entry per canonical path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    values: BTreeMap<String, String>,
}

impl Profile {
    /// Value stored under `path`, or `None` for paths outside the schema.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.values.get(path).map(String::as_str)
    }

    /// Stores a value after applying the same field normalization as [`sanitize`].
    pub fn set(&mut self, path: &str, value: &str) -> Result<(), ProfileError> {
        if !is_canonical(path) {
            return Err(ProfileError::UnknownPath(path.to_string()));
        }
        self.values
            .insert(path.to_string(), normalize_field(path, value));
        Ok(())
    }

    /// `(path, value)` pairs in canonical order.
    pub fn flatten(&self) -> Vec<(&'static str, &str)> {
        CANONICAL_PATHS
            .iter()
            .map(|path| (*path, self.get(path).unwrap_or_default()))
            .collect()
    }

    /// Nested JSON tree, e.g. `{"identity": {"email": ...}}`.
    pub fn to_json(&self) -> Value {
        let mut root = JsonMap::new();
        for (path, value) in self.flatten() {
            let Some((section, field)) = path.split_once('.') else {
                continue;
            };
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(JsonMap::new()));
            if let Value::Object(map) = entry {
                map.insert(field.to_string(), Value::String(value.to_string()));
            }
        }
        Value::Object(root)
    }
}

impl Default for Profile {
    fn default() -> Self {
        default_profile()
    }
}

pub fn default_profile() -> Profile {
    let values = CANONICAL_PATHS
        .iter()
        .map(|path| (path.to_string(), default_value(path).to_string()))
        .collect();
    Profile { values }
}

/// Builds a profile from untrusted input, dropping anything outside the schema.
///
/// Accepts the nested tree (`{"identity": {"email": ..}}`) as well as flat
/// dotted keys (`{"identity.email": ..}`); nested values win when both exist.
pub fn sanitize(input: &Value) -> Profile {
    let mut profile = default_profile();
    for path in CANONICAL_PATHS {
        let incoming = value_by_path(input, path).or_else(|| input.get(*path));
        if let Some(raw) = incoming.and_then(scalar_text) {
            profile
                .values
                .insert(path.to_string(), normalize_field(path, &raw));
        }
    }
    if profile
        .get("address.country")
        .map_or(true, |country| country.is_empty())
    {
        profile
            .values
            .insert("address.country".into(), DEFAULT_COUNTRY.into());
    }
    profile
}

/// Collapses yes/no spellings; anything else becomes empty.
pub fn normalize_yes_no(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => "yes",
        "no" | "n" | "false" | "0" => "no",
        _ => "",
    }
}

fn normalize_field(path: &str, value: &str) -> String {
    let trimmed = value.trim();
    if path.starts_with("work_auth.") {
        return normalize_yes_no(trimmed).to_string();
    }
    if path.starts_with("demographics.") && trimmed.is_empty() {
        return PREFER_NOT_TO_SAY.to_string();
    }
    if path == "address.country" && trimmed.is_empty() {
        return DEFAULT_COUNTRY.to_string();
    }
    trimmed.to_string()
}

fn default_value(path: &str) -> &'static str {
    if path.starts_with("demographics.") {
        PREFER_NOT_TO_SAY
    } else if path == "address.country" {
        DEFAULT_COUNTRY
    } else {
        ""
    }
}

fn is_canonical(path: &str) -> bool {
    CANONICAL_PATHS.contains(&path)
}

fn value_by_path<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(source, |current, key| current.as_object()?.get(key))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
