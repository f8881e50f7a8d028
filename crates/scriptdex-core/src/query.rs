use std::collections::HashMap;

use crate::error::{Result, ScriptdexError};
use crate::models::{CommandRecord, MatchKind, QueryHit, QueryOutcome};
use crate::providers::SemanticProvider;
use crate::store::CommandStore;

/// Records summarized for the semantic provider; the rest of the log is not
/// sent.
pub const SUMMARY_RECORD_LIMIT: usize = 50;

/// Runs the local strategies in fixed order, consults the semantic provider
/// only when they all come back empty, then deduplicates and ranks.
#[derive(Default)]
pub struct QueryEngine {
    provider: Option<Box<dyn SemanticProvider>>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("provider", &self.provider_id())
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self { provider: None }
    }

    #[must_use]
    pub fn with_provider(provider: Box<dyn SemanticProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    #[must_use]
    pub fn provider_id(&self) -> Option<&'static str> {
        self.provider.as_deref().map(|provider| provider.id())
    }

    #[must_use]
    pub fn query(&self, store: &CommandStore, text: &str, use_semantic: bool) -> QueryOutcome {
        let mut hits = Vec::new();

        for record in store.search_by_prefix(text) {
            hits.push(local_hit(record, MatchKind::Exact));
        }
        for record in store.search_by_tag(text).into_iter().flatten() {
            hits.push(local_hit(record, MatchKind::Tag));
        }
        for record in store.search_by_keyword(text).into_iter().flatten() {
            hits.push(local_hit(record, MatchKind::Keyword));
        }

        let mut semantic_failure = None;
        if hits.is_empty() && use_semantic {
            if let Some(provider) = self.provider.as_deref() {
                match semantic_hits(provider, store, text) {
                    Ok(semantic) => hits.extend(semantic),
                    Err(err) => semantic_failure = Some(err.to_string()),
                }
            }
        }

        QueryOutcome {
            hits: dedup_and_rank(hits),
            semantic_failure,
        }
    }

    pub fn explain(&self, record: &CommandRecord) -> Result<String> {
        let provider = self.provider.as_deref().ok_or_else(|| {
            ScriptdexError::Provider("no semantic provider configured".to_string())
        })?;
        provider.explain(record)
    }
}

fn local_hit(record: CommandRecord, match_type: MatchKind) -> QueryHit {
    QueryHit {
        record,
        match_type,
        ai_reason: None,
    }
}

fn semantic_hits(
    provider: &dyn SemanticProvider,
    store: &CommandStore,
    text: &str,
) -> Result<Vec<QueryHit>> {
    let summary = build_summary(store.records());
    let recommendations = provider.recommend(text, &summary)?;
    Ok(recommendations
        .into_iter()
        .filter_map(|rec| {
            // Recommendations for unknown names are dropped, not errors.
            store.get(&rec.command).cloned().map(|record| QueryHit {
                record,
                match_type: MatchKind::AiRecommendation,
                ai_reason: Some(rec.reason),
            })
        })
        .collect())
}

pub(crate) fn build_summary(records: &[CommandRecord]) -> String {
    records
        .iter()
        .take(SUMMARY_RECORD_LIMIT)
        .map(|record| {
            format!(
                "- {}: {} [{}]",
                record.name,
                record.description.as_deref().unwrap_or_default(),
                record.tags.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps one hit per name (the highest-priority occurrence, first-seen
/// position retained), then stable-sorts ascending by priority.
fn dedup_and_rank(hits: Vec<QueryHit>) -> Vec<QueryHit> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<QueryHit> = Vec::new();

    for hit in hits {
        debug_assert!(
            !hit.record.name.is_empty(),
            "storage layer must never emit a nameless record"
        );
        match position.get(&hit.record.name) {
            Some(&idx) => {
                if hit.match_type.priority() < merged[idx].match_type.priority() {
                    merged[idx] = hit;
                }
            }
            None => {
                position.insert(hit.record.name.clone(), merged.len());
                merged.push(hit);
            }
        }
    }

    merged.sort_by_key(|hit| hit.match_type.priority());
    merged
}
