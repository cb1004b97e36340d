//! Name casing at the data boundary.
//!
//! External (document) names are PascalCase, internal (attribute) names are
//! snake_case, enum members are SCREAMING_SNAKE. Any name that the mechanical
//! conversion cannot carry back and forth is recorded in a [`SpecialNames`] set
//! and passed through untouched in both directions.
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;

static UPPER_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static regex"));
static LOWER_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

// ------------------------------ Special names ---------------------------- //

/// Names exempt from case translation. Grows lazily while data is decoded, so
/// it is shared behind a lock by the type that owns it.
#[derive(Debug, Default)]
pub struct SpecialNames {
    names: RwLock<BTreeSet<String>>,
}

impl SpecialNames {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.names.read().unwrap_or_else(PoisonError::into_inner).contains(name)
    }
    pub fn insert(&self, name: impl Into<String>) {
        self.names.write().unwrap_or_else(PoisonError::into_inner).insert(name.into());
    }
    pub fn extend_from(&self, other: &SpecialNames) {
        let incoming = other.snapshot();
        self.names.write().unwrap_or_else(PoisonError::into_inner).extend(incoming);
    }
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.names.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(PoisonError::into_inner).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for SpecialNames {
    fn clone(&self) -> Self {
        Self { names: RwLock::new(self.snapshot()) }
    }
}

impl<S: Into<String>> FromIterator<S> for SpecialNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { names: RwLock::new(iter.into_iter().map(Into::into).collect()) }
    }
}

// ------------------------------ Conversions ------------------------------ //

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// `SampleMass` → `sample_mass`.
///
/// Non-identifiers come back unchanged. Names that already contain `_`, or
/// whose conversion would not map back onto themselves (`HTTPCode`,
/// `camelCase`), are added to `special` and come back unchanged.
pub fn pascal_to_snake(name: &str, special: &SpecialNames) -> String {
    match split_words(name, special, true) {
        Some(words) => words.to_lowercase(),
        None => name.to_string(),
    }
}

/// `sample_mass` → `SampleMass`, unless `name` is special or not an identifier.
pub fn snake_to_pascal(name: &str, special: &SpecialNames) -> String {
    if !is_identifier(name) || special.contains(name) {
        return name.to_string();
    }
    pascal_join(name)
}

/// `TemperatureRamp` → `TEMPERATURE_RAMP`. Only non-identifiers and names
/// containing `_` are escaped; member names need not map back.
pub fn pascal_to_screaming_snake(name: &str, special: &SpecialNames) -> String {
    match split_words(name, special, false) {
        Some(words) => words.to_uppercase(),
        None => name.to_string(),
    }
}

/// `TEMPERATURE_RAMP` → `TemperatureRamp`.
pub fn screaming_snake_to_pascal(name: &str, special: &SpecialNames) -> String {
    snake_to_pascal(name, special)
}

fn split_words(name: &str, special: &SpecialNames, round_trip: bool) -> Option<String> {
    if !is_identifier(name) || special.contains(name) {
        return None;
    }
    if name.contains('_') {
        special.insert(name);
        return None;
    }
    let spaced = UPPER_WORD.replace_all(name, "${1}_${2}");
    let spaced = LOWER_UPPER.replace_all(&spaced, "${1}_${2}").into_owned();
    if round_trip && pascal_join(&spaced) != name {
        special.insert(name);
        return None;
    }
    Some(spaced)
}

fn pascal_join(snake: &str) -> String {
    snake.split('_').map(capitalize).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_snake_basic() {
        let special = SpecialNames::new();
        assert_eq!(pascal_to_snake("SampleMass", &special), "sample_mass");
        assert_eq!(pascal_to_snake("Name", &special), "name");
        assert_eq!(pascal_to_snake("Step2Temperature", &special), "step2_temperature");
        assert_eq!(snake_to_pascal("sample_mass", &special), "SampleMass");
        assert!(special.is_empty());
    }

    #[test]
    fn underscores_and_acronyms_become_special() {
        let special = SpecialNames::new();
        assert_eq!(pascal_to_snake("Sample_Mass", &special), "Sample_Mass");
        assert_eq!(pascal_to_snake("HTTPCode", &special), "HTTPCode");
        assert_eq!(pascal_to_snake("camelCase", &special), "camelCase");
        assert!(special.contains("Sample_Mass"));
        assert!(special.contains("HTTPCode"));
        assert_eq!(snake_to_pascal("HTTPCode", &special), "HTTPCode");
    }

    #[test]
    fn non_identifiers_pass_through() {
        let special = SpecialNames::new();
        assert_eq!(pascal_to_snake("Mass (mg)", &special), "Mass (mg)");
        assert_eq!(snake_to_pascal("1st", &special), "1st");
        assert!(special.is_empty());
    }

    #[test]
    fn bijection_over_identifiers() {
        let special = SpecialNames::new();
        let names = [
            "SampleMass", "Id", "ID", "XMLHttpRequest", "Results", "A", "aB", "Name2", "Mass_mg",
            "TemperatureRampRate", "SomeURLValue", "Ümlaut",
        ];
        for name in names {
            let snake = pascal_to_snake(name, &special);
            assert_eq!(snake_to_pascal(&snake, &special), name, "{name} -> {snake}");
        }
    }

    #[test]
    fn screaming_variants() {
        let special = SpecialNames::new();
        assert_eq!(pascal_to_screaming_snake("TemperatureRamp", &special), "TEMPERATURE_RAMP");
        assert_eq!(screaming_snake_to_pascal("TEMPERATURE_RAMP", &special), "TemperatureRamp");
        assert_eq!(pascal_to_screaming_snake("isothermal", &special), "ISOTHERMAL");
        assert_eq!(pascal_to_screaming_snake("Step-1", &special), "Step-1");
    }

    #[test]
    fn clone_copies_contents() {
        let special: SpecialNames = ["Foo_Bar"].into_iter().collect();
        let copy = special.clone();
        copy.insert("Other_Name");
        assert!(copy.contains("Foo_Bar"));
        assert!(!special.contains("Other_Name"));
    }
}
