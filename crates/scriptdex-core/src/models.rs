use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexed command. `name` is the sole identity key; everything past
/// `tags` is opaque pass-through metadata the index never interprets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// How a hit entered the result set. Priority is fixed: an exact/prefix hit
/// always outranks a tag hit, which outranks a keyword hit, which outranks a
/// semantic recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchKind {
    #[serde(rename = "exact_match")]
    Exact,
    #[serde(rename = "tag_match")]
    Tag,
    #[serde(rename = "keyword_match")]
    Keyword,
    #[serde(rename = "ai_recommendation")]
    AiRecommendation,
}

impl MatchKind {
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Exact => 0,
            Self::Tag => 1,
            Self::Keyword => 2,
            Self::AiRecommendation => 3,
        }
    }
}

/// A ranked query result. The record fields are flattened so emitted JSON
/// reads as the record plus `match_type` and an optional `ai_reason`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryHit {
    #[serde(flatten)]
    pub record: CommandRecord,
    pub match_type: MatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_reason: Option<String>,
}

/// Result of one query. A failed semantic stage never fails the query; it
/// leaves a note here instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryOutcome {
    pub hits: Vec<QueryHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_failure: Option<String>,
}

/// One entry of a semantic provider's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub command: String,
    pub reason: String,
}

/// Persisted index blob. The `records`, `tag_index`, and `description_index`
/// field names are a compatibility contract for anyone reading the file
/// directly. Only `records` is authoritative on load; the index mappings are
/// informational and always rebuilt by replaying inserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub records: Vec<CommandRecord>,
    #[serde(default)]
    pub tag_index: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub description_index: BTreeMap<String, Vec<String>>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreStats {
    /// Audit-log length, historical duplicates included.
    pub total_records: usize,
    pub distinct_names: usize,
    pub tag_tokens: usize,
    pub description_tokens: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub stats: StoreStats,
    pub snapshot_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<String>,
}

/// Outcome counters for one scan pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub scanned_files: usize,
    pub indexed_commands: usize,
    /// Script files seen but not indexed, with the reason each was skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl ScanReport {
    #[allow(
        clippy::cast_precision_loss,
        reason = "counter magnitudes stay far below f64 integer precision"
    )]
    #[must_use]
    pub fn coverage_rate(&self) -> f64 {
        if self.scanned_files == 0 {
            return 0.0;
        }
        self.indexed_commands as f64 / self.scanned_files as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_kind_serializes_to_contract_names() {
        let names = [
            (MatchKind::Exact, "exact_match"),
            (MatchKind::Tag, "tag_match"),
            (MatchKind::Keyword, "keyword_match"),
            (MatchKind::AiRecommendation, "ai_recommendation"),
        ];
        for (kind, expected) in names {
            let value = serde_json::to_value(kind).expect("serialize match kind");
            assert_eq!(value, serde_json::Value::String(expected.to_string()));
        }
    }

    #[test]
    fn match_kind_priority_is_total_and_ascending() {
        assert!(MatchKind::Exact.priority() < MatchKind::Tag.priority());
        assert!(MatchKind::Tag.priority() < MatchKind::Keyword.priority());
        assert!(MatchKind::Keyword.priority() < MatchKind::AiRecommendation.priority());
    }

    #[test]
    fn record_omits_absent_optional_fields() {
        let record = CommandRecord {
            name: "grep".to_string(),
            ..CommandRecord::default()
        };
        let value = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(value, serde_json::json!({"name": "grep"}));
    }

    #[test]
    fn query_hit_flattens_record_fields() {
        let hit = QueryHit {
            record: CommandRecord {
                name: "grep".to_string(),
                description: Some("search text patterns".to_string()),
                ..CommandRecord::default()
            },
            match_type: MatchKind::Tag,
            ai_reason: None,
        };
        let value = serde_json::to_value(&hit).expect("serialize hit");
        assert_eq!(value["name"], "grep");
        assert_eq!(value["match_type"], "tag_match");
        assert!(value.get("ai_reason").is_none());
    }

    #[test]
    fn snapshot_tolerates_missing_index_mappings() {
        let raw = r#"{"records": [{"name": "grep"}]}"#;
        let snapshot: StoreSnapshot = serde_json::from_str(raw).expect("parse minimal snapshot");
        assert_eq!(snapshot.records.len(), 1);
        assert!(snapshot.tag_index.is_empty());
        assert!(snapshot.description_index.is_empty());
    }

    #[test]
    fn scan_report_coverage_handles_empty_scan() {
        let report = ScanReport::default();
        assert_eq!(report.coverage_rate(), 0.0);
    }
}
