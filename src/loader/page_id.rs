//! Page identifiers and module paths

use std::fmt;

/// Page identifier used when the document declares none
pub const DEFAULT_PAGE_ID: &str = "default";

/// Shared module run before every page module
pub const COMMON_MODULE: &str = "common";

/// Directory page modules are served from
pub const PAGES_BASE_PATH: &str = "/static/js/pages/";

/// Body attribute carrying the page identifier
pub const PAGE_ATTRIBUTE: &str = "data-page";

/// Dot-segmented page identifier, e.g. `about.widgets`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageIdentifier(String);

impl PageIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier from a raw attribute value: trimmed, or `"default"` when
    /// absent, empty or whitespace-only
    pub fn resolve(raw: Option<&str>) -> Self {
        Self::resolve_or(raw, DEFAULT_PAGE_ID)
    }

    /// Like [`PageIdentifier::resolve`] with a custom fallback
    pub fn resolve_or(raw: Option<&str>, fallback: &str) -> Self {
        match raw.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self(fallback.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dot-separated segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for PageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Location of a page module: `<base><segments joined by />.js`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(String);

impl ModulePath {
    /// Path under [`PAGES_BASE_PATH`]
    pub fn from_identifier(id: &PageIdentifier) -> Self {
        Self::with_base(PAGES_BASE_PATH, id)
    }

    /// Path under a custom base directory. A missing trailing `/` on the base
    /// is supplied.
    pub fn with_base(base: &str, id: &PageIdentifier) -> Self {
        let segments = id.segments().collect::<Vec<_>>().join("/");
        if base.is_empty() || base.ends_with('/') {
            Self(format!("{}{}.js", base, segments))
        } else {
            Self(format!("{}/{}.js", base, segments))
        }
    }

    /// Wrap an already computed path
    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_to_path() {
        let path = ModulePath::from_identifier(&"about.widgets".into());
        assert_eq!(path.as_str(), "/static/js/pages/about/widgets.js");

        let path = ModulePath::from_identifier(&"index".into());
        assert_eq!(path.as_str(), "/static/js/pages/index.js");

        // deterministic
        assert_eq!(
            ModulePath::from_identifier(&"a.b.c".into()),
            ModulePath::from_identifier(&"a.b.c".into())
        );
    }

    #[test]
    fn test_identifier_to_path_is_total() {
        assert_eq!(ModulePath::from_identifier(&"".into()).as_str(), "/static/js/pages/.js");
        assert_eq!(
            ModulePath::from_identifier(&"a..b".into()).as_str(),
            "/static/js/pages/a//b.js"
        );
        assert_eq!(ModulePath::from_identifier(&"a.".into()).as_str(), "/static/js/pages/a/.js");
    }

    #[test]
    fn test_custom_base() {
        let id = PageIdentifier::new("app.dashboard");
        assert_eq!(
            ModulePath::with_base("/assets/pages", &id).as_str(),
            "/assets/pages/app/dashboard.js"
        );
        assert_eq!(ModulePath::with_base("/assets/", &id).as_str(), "/assets/app/dashboard.js");
    }

    #[test]
    fn test_resolve_page_identifier() {
        assert_eq!(PageIdentifier::resolve(None).as_str(), "default");
        assert_eq!(PageIdentifier::resolve(Some("")).as_str(), "default");
        assert_eq!(PageIdentifier::resolve(Some("  \t\n")).as_str(), "default");
        assert_eq!(PageIdentifier::resolve(Some("  about ")).as_str(), "about");
        assert_eq!(PageIdentifier::resolve(Some("app.dashboard")).as_str(), "app.dashboard");
        assert_eq!(PageIdentifier::resolve_or(Some(" "), "home").as_str(), "home");
    }
}
