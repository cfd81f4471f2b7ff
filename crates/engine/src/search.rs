//! Accent- and case-insensitive text search over records.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// A record that can be matched by a free-text search term.
pub trait Searchable {
    /// Text fields the term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, term: &str) -> bool {
        let term = fold(term);
        if term.is_empty() {
            return true;
        }
        self.search_fields()
            .into_iter()
            .any(|field| fold(field).contains(&term))
    }
}

/// Records whose fields contain `term`, in their original order. An empty term
/// returns everything.
pub fn search<'a, T: Searchable>(records: &'a [T], term: &str) -> Vec<&'a T> {
    records.iter().filter(|record| record.matches(term)).collect()
}

/// Lowercased, NFD-decomposed text with combining marks removed
/// (`"Inês"` becomes `"ines"`).
pub fn fold(text: &str) -> String {
    text.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Searchable for Named {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.0]
        }
    }

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("  Inês Conceição "), "ines conceicao");
    }

    #[test]
    fn search_ignores_accents() {
        let records = [Named("João"), Named("Ana"), Named("Joana")];
        let found = search(&records, "joa");
        assert_eq!(found.len(), 2);
        assert_eq!(search(&records, "").len(), 3);
        assert!(search(&records, "zé").is_empty());
    }
}
