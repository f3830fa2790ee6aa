//! Source-code extension tables

/// Extensions treated as source code, in no particular order
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "java", "c", "cpp", "h", "hpp", "html", "css", "js", "ts", "rs", "go", "rb", "sh",
];

/// extension → (fence tag, display name); recognized extensions missing here get an empty tag
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("py", "python", "Python"),
    ("java", "java", "Java"),
    ("c", "c", "C"),
    ("cpp", "cpp", "C++"),
    ("html", "html", "HTML"),
    ("css", "css", "CSS"),
    ("js", "javascript", "JavaScript"),
    ("ts", "typescript", "TypeScript"),
    ("rs", "rust", "Rust"),
    ("go", "go", "Go"),
    ("rb", "ruby", "Ruby"),
    ("sh", "bash", "Shell"),
];

/// Language label attached to extracted source code
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LanguageTag {
    tag: &'static str,
    name: &'static str,
}

impl LanguageTag {
    /// The unknown language (empty tag)
    pub const UNKNOWN: LanguageTag = LanguageTag { tag: "", name: "" };

    /// Look up the label for a lowercase extension
    pub fn for_extension(extension: &str) -> Self {
        LANGUAGES
            .iter()
            .find(|(ext, _, _)| *ext == extension)
            .map(|(_, tag, name)| LanguageTag { tag, name })
            .unwrap_or(Self::UNKNOWN)
    }

    /// Markdown fence tag, e.g. `python`; empty when unknown
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Display name, e.g. `Python`; empty when unknown
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether no label is known for the extension
    pub fn is_unknown(&self) -> bool {
        self.tag.is_empty()
    }
}

/// Whether a lowercase extension belongs to the source-code set
pub fn is_source_extension(extension: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages() {
        assert_eq!(LanguageTag::for_extension("py").tag(), "python");
        assert_eq!(LanguageTag::for_extension("py").name(), "Python");
        assert_eq!(LanguageTag::for_extension("js").tag(), "javascript");
        assert_eq!(LanguageTag::for_extension("cpp").name(), "C++");
    }

    #[test]
    fn test_unmapped_source_extension_is_unknown_not_error() {
        assert!(is_source_extension("h"));
        assert!(LanguageTag::for_extension("h").is_unknown());
        assert!(LanguageTag::for_extension("hpp").is_unknown());
    }

    #[test]
    fn test_every_mapped_language_is_a_source_extension() {
        for (ext, _, _) in LANGUAGES {
            assert!(is_source_extension(ext), "{} missing from SOURCE_EXTENSIONS", ext);
        }
    }

    #[test]
    fn test_non_source_extensions() {
        assert!(!is_source_extension("pdf"));
        assert!(!is_source_extension("png"));
        assert!(!is_source_extension("PY"));
    }
}
