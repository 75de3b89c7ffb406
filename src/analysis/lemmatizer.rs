//! Dictionary-form lemmatizer for English tokens.
//!
//! Reduces each token to its dictionary (noun) form: an irregular-form
//! lookup followed by plural suffix rules. The mapping is idempotent, so
//! re-normalizing already-normalized text leaves tokens unchanged.
//!
//! # Examples
//!
//! ```
//! use vitae::analysis::Lemmatizer;
//!
//! let lemmatizer = Lemmatizer::new();
//!
//! assert_eq!(lemmatizer.lemmatize("engineers"), "engineer");
//! assert_eq!(lemmatizer.lemmatize("studies"), "study");
//! assert_eq!(lemmatizer.lemmatize("children"), "child");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

/// Irregular noun forms that suffix rules cannot recover.
static IRREGULAR_NOUNS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("men", "man");
    map.insert("women", "woman");
    map.insert("children", "child");
    map.insert("people", "person");
    map.insert("feet", "foot");
    map.insert("teeth", "tooth");
    map.insert("geese", "goose");
    map.insert("mice", "mouse");
    map.insert("lives", "life");
    map.insert("leaves", "leaf");
    map.insert("analyses", "analysis");
    map.insert("theses", "thesis");
    map.insert("criteria", "criterion");
    map.insert("phenomena", "phenomenon");
    map
});

/// English noun lemmatizer.
#[derive(Debug, Clone, Default)]
pub struct Lemmatizer;

impl Lemmatizer {
    /// Create a new lemmatizer.
    pub fn new() -> Self {
        Lemmatizer
    }

    /// Reduce a lowercase token to its dictionary form.
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(&lemma) = IRREGULAR_NOUNS.get(token) {
            return lemma.to_string();
        }

        if let Some(stem) = token.strip_suffix("sses") {
            return format!("{stem}ss");
        }
        if token.len() > 4 {
            if let Some(stem) = token.strip_suffix("ies") {
                return format!("{stem}y");
            }
        }
        for suffix in ["ches", "shes", "xes", "zes"] {
            if let Some(stem) = token.strip_suffix(suffix) {
                return format!("{}{}", stem, &suffix[..suffix.len() - 2]);
            }
        }
        if token.len() > 3
            && token.ends_with('s')
            && !token.ends_with("ss")
            && !token.ends_with("us")
            && !token.ends_with("is")
        {
            return token[..token.len() - 1].to_string();
        }

        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("engineers"), "engineer");
        assert_eq!(lemmatizer.lemmatize("skills"), "skill");
        assert_eq!(lemmatizer.lemmatize("databases"), "database");
    }

    #[test]
    fn test_suffix_rules() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("studies"), "study");
        assert_eq!(lemmatizer.lemmatize("classes"), "class");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("branches"), "branch");
    }

    #[test]
    fn test_irregular_nouns() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("analyses"), "analysis");
        assert_eq!(lemmatizer.lemmatize("people"), "person");
    }

    #[test]
    fn test_protected_endings() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("analysis"), "analysis");
        assert_eq!(lemmatizer.lemmatize("class"), "class");
        assert_eq!(lemmatizer.lemmatize("status"), "status");
    }

    #[test]
    fn test_idempotent() {
        let lemmatizer = Lemmatizer::new();
        for word in ["engineers", "studies", "children", "boxes", "rust", "data"] {
            let once = lemmatizer.lemmatize(word);
            let twice = lemmatizer.lemmatize(&once);
            assert_eq!(once, twice, "lemmatize must be idempotent for {word}");
        }
    }
}
