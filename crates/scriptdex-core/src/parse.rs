use crate::models::CommandRecord;

const BEGIN_MARKER: &str = "=== BEGIN METADATA ===";
const END_MARKER: &str = "=== END METADATA ===";

/// Comment leaders for the script dialects the scanner understands.
const COMMENT_SYMBOLS: &[(&str, &str)] = &[
    ("sh", "#"),
    ("bash", "#"),
    ("py", "#"),
    ("rb", "#"),
    ("js", "//"),
    ("ts", "//"),
    ("pl", "#"),
    ("lua", "--"),
];

/// Extracts the annotated metadata block scripts carry near their top:
///
/// ```text
/// # === BEGIN METADATA ===
/// # name: backup-etc
/// # description: nightly tarball of /etc
/// # tags: backup, ops
/// # === END METADATA ===
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataParser;

impl MetadataParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn comment_symbol(ext: &str) -> &'static str {
        COMMENT_SYMBOLS
            .iter()
            .find(|(known, _)| *known == ext)
            .map_or("#", |(_, symbol)| *symbol)
    }

    /// Parses the first complete metadata block. None when the file carries
    /// no block, or an opened block never closes.
    #[must_use]
    pub fn parse_source(&self, content: &str, ext: &str) -> Option<CommandRecord> {
        let symbol = Self::comment_symbol(&ext.to_ascii_lowercase());
        let begin = format!("{symbol} {BEGIN_MARKER}");
        let end = format!("{symbol} {END_MARKER}");

        let mut record = CommandRecord::default();
        let mut in_block = false;
        let mut closed = false;

        for line in content.lines() {
            let trimmed = line.trim();
            if !in_block {
                if trimmed == begin {
                    in_block = true;
                }
                continue;
            }
            if trimmed == end {
                closed = true;
                break;
            }
            let Some(rest) = trimmed.strip_prefix(symbol) else {
                continue;
            };
            let Some((field, value)) = rest.trim_start().split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match field.trim() {
                "name" => record.name = value.to_string(),
                "description" => record.description = Some(value.to_string()),
                "usage" => record.usage = Some(value.to_string()),
                "version" => record.version = Some(value.to_string()),
                "author" => record.author = Some(value.to_string()),
                "dependencies" => record.dependencies = split_list(value),
                "tags" => record.tags = split_list(value),
                _ => {}
            }
        }

        closed.then_some(record)
    }

    /// A usable command needs at least a name and a description.
    #[must_use]
    pub fn validate(record: &CommandRecord) -> bool {
        !record.name.is_empty() && record.description.is_some()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SH_SCRIPT: &str = "\
#!/usr/bin/env bash
# === BEGIN METADATA ===
# name: backup-etc
# description: nightly tarball of /etc
# usage: backup-etc <dest>
# version: 1.2.0
# author: ops
# dependencies: tar, gzip
# tags: backup, ops
# === END METADATA ===
tar czf \"$1\" /etc
";

    #[test]
    fn parses_full_shell_block() {
        let record = MetadataParser::new()
            .parse_source(SH_SCRIPT, "sh")
            .expect("block parses");

        assert_eq!(record.name, "backup-etc");
        assert_eq!(record.description.as_deref(), Some("nightly tarball of /etc"));
        assert_eq!(record.usage.as_deref(), Some("backup-etc <dest>"));
        assert_eq!(record.version.as_deref(), Some("1.2.0"));
        assert_eq!(record.dependencies, vec!["tar", "gzip"]);
        assert_eq!(record.tags, vec!["backup", "ops"]);
        assert!(MetadataParser::validate(&record));
    }

    #[test]
    fn honors_per_extension_comment_symbols() {
        let js = "\
// === BEGIN METADATA ===
// name: bundle
// description: bundles the frontend
// === END METADATA ===
";
        let record = MetadataParser::new()
            .parse_source(js, "js")
            .expect("js block parses");
        assert_eq!(record.name, "bundle");

        let lua = "\
-- === BEGIN METADATA ===
-- name: hook
-- description: editor hook
-- === END METADATA ===
";
        let record = MetadataParser::new()
            .parse_source(lua, "lua")
            .expect("lua block parses");
        assert_eq!(record.name, "hook");
    }

    #[test]
    fn unknown_extension_falls_back_to_hash() {
        assert_eq!(MetadataParser::comment_symbol("zsh"), "#");
        assert_eq!(MetadataParser::comment_symbol("ts"), "//");
    }

    #[test]
    fn missing_or_unterminated_block_yields_none() {
        let parser = MetadataParser::new();
        assert!(parser.parse_source("echo hi\n", "sh").is_none());

        let unterminated = "# === BEGIN METADATA ===\n# name: lost\n";
        assert!(parser.parse_source(unterminated, "sh").is_none());
    }

    #[test]
    fn values_keep_embedded_colons() {
        let script = "\
# === BEGIN METADATA ===
# name: probe
# description: checks host:port reachability
# === END METADATA ===
";
        let record = MetadataParser::new()
            .parse_source(script, "sh")
            .expect("block parses");
        assert_eq!(
            record.description.as_deref(),
            Some("checks host:port reachability")
        );
    }

    #[test]
    fn validate_requires_name_and_description() {
        let mut record = CommandRecord::default();
        assert!(!MetadataParser::validate(&record));

        record.name = "probe".to_string();
        assert!(!MetadataParser::validate(&record));

        record.description = Some("checks things".to_string());
        assert!(MetadataParser::validate(&record));
    }

    #[test]
    fn list_fields_trim_and_drop_empty_items() {
        let script = "\
# === BEGIN METADATA ===
# name: deploy
# description: ships a release
# tags: release, , ops ,
# === END METADATA ===
";
        let record = MetadataParser::new()
            .parse_source(script, "sh")
            .expect("block parses");
        assert_eq!(record.tags, vec!["release", "ops"]);
    }
}
