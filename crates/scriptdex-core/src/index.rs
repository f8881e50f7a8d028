use std::collections::BTreeMap;

/// Inverted index from a lowercased token to the names of records carrying
/// that token. Posting lists keep insertion order and accumulate additively;
/// re-indexing a name appends rather than replaces.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<String>>,
}

impl InvertedIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: &str, name: &str) {
        self.postings
            .entry(token.to_lowercase())
            .or_default()
            .push(name.to_string());
    }

    /// Posting list for the token, matched case-insensitively. Empty when
    /// the token was never indexed.
    #[must_use]
    pub fn lookup(&self, token: &str) -> &[String] {
        self.postings
            .get(&token.to_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Full mapping clone for snapshot emission.
    #[must_use]
    pub fn export(&self) -> BTreeMap<String, Vec<String>> {
        self.postings.clone()
    }

    pub fn clear(&mut self) {
        self.postings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_lookup_normalize_case() {
        let mut index = InvertedIndex::new();
        index.add("Search", "grep");

        assert_eq!(index.lookup("search"), ["grep"]);
        assert_eq!(index.lookup("SEARCH"), ["grep"]);
        assert_eq!(index.token_count(), 1);
    }

    #[test]
    fn missing_token_yields_empty_slice() {
        let index = InvertedIndex::new();
        assert!(index.lookup("absent").is_empty());
    }

    #[test]
    fn duplicate_entries_accumulate_in_insertion_order() {
        let mut index = InvertedIndex::new();
        index.add("text", "grep");
        index.add("text", "sed");
        index.add("text", "grep");

        assert_eq!(index.lookup("text"), ["grep", "sed", "grep"]);
    }

    #[test]
    fn export_round_trips_the_mapping() {
        let mut index = InvertedIndex::new();
        index.add("a", "one");
        index.add("b", "two");

        let map = index.export();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], vec!["one".to_string()]);
    }
}
