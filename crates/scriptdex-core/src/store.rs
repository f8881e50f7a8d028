use chrono::Utc;

use crate::index::InvertedIndex;
use crate::models::{CommandRecord, StoreSnapshot, StoreStats};
use crate::trie::CommandTrie;

/// Owns the trie, both inverted indices, and the append-only record log.
///
/// The trie is the authoritative name resolver. The log is diagnostic and
/// audit-only: it keeps every insert in arrival order, so re-inserting a
/// name leaves the superseded entry in place while every lookup path
/// resolves to the latest record.
#[derive(Debug, Clone, Default)]
pub struct CommandStore {
    trie: CommandTrie,
    tag_index: InvertedIndex,
    description_index: InvertedIndex,
    log: Vec<CommandRecord>,
}

impl CommandStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// No-op when the record has an empty name. Index entries accumulate
    /// additively across re-inserts of the same name.
    pub fn insert(&mut self, record: CommandRecord) {
        if record.name.is_empty() {
            return;
        }
        for tag in &record.tags {
            self.tag_index.add(tag, &record.name);
        }
        if let Some(description) = &record.description {
            for word in description.to_lowercase().split_whitespace() {
                self.description_index.add(word, &record.name);
            }
        }
        self.log.push(record.clone());
        self.trie.insert(record);
    }

    pub fn insert_batch(&mut self, records: impl IntoIterator<Item = CommandRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandRecord> {
        self.trie.get(name)
    }

    #[must_use]
    pub fn search_by_prefix(&self, prefix: &str) -> Vec<CommandRecord> {
        self.trie
            .collect_prefix(prefix)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolves the tag's posting list through the trie. An indexed name
    /// that no longer resolves surfaces as `None` rather than a panic.
    #[must_use]
    pub fn search_by_tag(&self, tag: &str) -> Vec<Option<CommandRecord>> {
        self.resolve_names(self.tag_index.lookup(tag))
    }

    #[must_use]
    pub fn search_by_keyword(&self, word: &str) -> Vec<Option<CommandRecord>> {
        self.resolve_names(self.description_index.lookup(word))
    }

    /// The append-only audit log, historical duplicates included.
    #[must_use]
    pub fn records(&self) -> &[CommandRecord] {
        &self.log
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_records: self.log.len(),
            distinct_names: self.trie.distinct_names(),
            tag_tokens: self.tag_index.token_count(),
            description_tokens: self.description_index.token_count(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: self.log.clone(),
            tag_index: self.tag_index.export(),
            description_index: self.description_index.export(),
            saved_at: Utc::now(),
        }
    }

    /// Clears current state and replays `insert` over the snapshot's record
    /// list in original order. The persisted index mappings are never
    /// restored directly.
    pub fn rebuild_from(&mut self, snapshot: StoreSnapshot) {
        self.clear();
        self.insert_batch(snapshot.records);
    }

    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::new();
        store.rebuild_from(snapshot);
        store
    }

    pub fn clear(&mut self) {
        self.trie.clear();
        self.tag_index.clear();
        self.description_index.clear();
        self.log.clear();
    }

    fn resolve_names(&self, names: &[String]) -> Vec<Option<CommandRecord>> {
        names
            .iter()
            .map(|name| self.trie.get(name).cloned())
            .collect()
    }
}
