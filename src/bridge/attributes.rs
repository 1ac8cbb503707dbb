//! Attribute-derived configuration
//!
//! HTML parsers lower-case attribute names, so a camel-cased name declared by a
//! widget (`copiedLabel`) is looked up exactly first, then lower-cased.

use crate::dom::DomElement;

/// Read-only attribute view used to derive an island's configuration
pub struct Attributes<'a> {
    element: &'a dyn DomElement,
}

impl<'a> Attributes<'a> {
    pub fn new(element: &'a dyn DomElement) -> Self {
        Self { element }
    }

    /// Case-sensitive lookup with a lower-case fallback
    pub fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.element.get_attribute(name) {
            return Some(value);
        }
        let lower = name.to_ascii_lowercase();
        if lower != name {
            return self.element.get_attribute(&lower);
        }
        None
    }

    /// First present value among aliases, in order
    pub fn first(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.lookup(name))
    }

    /// Value of `name`, or `default` when absent
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.lookup(name).unwrap_or_else(|| default.to_string())
    }

    /// First present alias, or `default` when none is set
    pub fn first_or(&self, names: &[&str], default: &str) -> String {
        self.first(names).unwrap_or_else(|| default.to_string())
    }
}

/// Whether `name` is one of `observed`, compared case-insensitively
pub fn is_observed(observed: &[&str], name: &str) -> bool {
    observed.iter().any(|o| o.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryElement;

    #[test]
    fn test_exact_name_wins() {
        let el = MemoryElement::new("z8-copy-button")
            .with_attribute("copiedLabel", "exact")
            .with_attribute("copiedlabel", "lower");
        let attrs = Attributes::new(&el);
        assert_eq!(attrs.lookup("copiedLabel").as_deref(), Some("exact"));
    }

    #[test]
    fn test_lower_case_fallback() {
        let el = MemoryElement::new("z8-island-pref").with_attribute("storagekey", "k");
        let attrs = Attributes::new(&el);
        assert_eq!(attrs.lookup("storageKey").as_deref(), Some("k"));
        assert_eq!(attrs.get_or("label", "fallback"), "fallback");
    }

    #[test]
    fn test_aliases_in_order() {
        let el = MemoryElement::new("z8-copy-button").with_attribute("copied-label", "Done");
        let attrs = Attributes::new(&el);
        assert_eq!(attrs.first_or(&["copiedLabel", "copied-label"], "Copied!"), "Done");

        let el = MemoryElement::new("z8-copy-button");
        let attrs = Attributes::new(&el);
        assert_eq!(attrs.first_or(&["copiedLabel", "copied-label"], "Copied!"), "Copied!");
    }

    #[test]
    fn test_is_observed_ignores_case() {
        let observed = ["text", "copiedLabel"];
        assert!(is_observed(&observed, "copiedlabel"));
        assert!(is_observed(&observed, "TEXT"));
        assert!(!is_observed(&observed, "class"));
    }
}
