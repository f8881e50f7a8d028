use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Result, ScriptdexError};
use crate::models::{CommandRecord, ScanReport};
use crate::parse::MetadataParser;

/// Extensions treated as scripts regardless of the executable bit.
pub const SCRIPT_EXTENSIONS: &[&str] = &["sh", "bash", "py", "rb", "js", "ts", "pl", "lua"];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    pub exclude: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_hidden: false,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub records: Vec<CommandRecord>,
    pub report: ScanReport,
}

/// Walks a directory for annotated scripts and turns their metadata blocks
/// into records ready for insertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandScanner {
    parser: MetadataParser,
}

impl CommandScanner {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parser: MetadataParser::new(),
        }
    }

    pub fn scan_directory(&self, directory: &Path, options: &ScanOptions) -> Result<ScanOutcome> {
        if !directory.is_dir() {
            return Err(ScriptdexError::NotFound(format!(
                "scan directory does not exist: {}",
                directory.display()
            )));
        }
        let exclude = build_exclude_set(&options.exclude)?;

        let mut records = Vec::new();
        let mut report = ScanReport::default();

        let mut walker = WalkDir::new(directory).follow_links(false);
        if !options.recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            let entry = entry.map_err(|err| ScriptdexError::Validation(err.to_string()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(directory).unwrap_or(path);
            if !options.include_hidden && has_hidden_component(relative) {
                continue;
            }
            if exclude.is_match(relative) {
                continue;
            }
            if !is_script_file(path) {
                continue;
            }

            report.scanned_files += 1;
            let bytes = fs::read(path)?;
            let Ok(content) = std::str::from_utf8(&bytes) else {
                report
                    .skipped
                    .push(format!("{}: not valid UTF-8", path.display()));
                continue;
            };

            let ext = path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase();
            match self.parser.parse_source(content, &ext) {
                Some(mut record) if MetadataParser::validate(&record) => {
                    record.source_path = Some(path.display().to_string());
                    record.content_hash = Some(blake3::hash(&bytes).to_hex().to_string());
                    records.push(record);
                    report.indexed_commands += 1;
                }
                Some(_) => report
                    .skipped
                    .push(format!("{}: metadata lacks name or description", path.display())),
                None => report
                    .skipped
                    .push(format!("{}: no metadata block", path.display())),
            }
        }

        Ok(ScanOutcome { records, report })
    }
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            continue;
        }
        let glob = Glob::new(trimmed).map_err(|err| {
            ScriptdexError::Validation(format!("invalid scan exclude glob '{trimmed}': {err}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| ScriptdexError::Validation(format!("invalid scan exclude globs: {err}")))
}

fn has_hidden_component(relative: &Path) -> bool {
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_string_lossy()
            .starts_with('.')
    })
}

fn is_script_file(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => SCRIPT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        // Extensionless files count when they carry the executable bit.
        None => is_executable(path),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATED: &str = "\
#!/bin/sh
# === BEGIN METADATA ===
# name: NAME
# description: does a thing
# tags: demo
# === END METADATA ===
";

    fn write_script(dir: &Path, rel: &str, name: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, ANNOTATED.replace("NAME", name)).expect("write script");
    }

    #[test]
    fn missing_directory_is_a_not_found_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent");
        let err = CommandScanner::new()
            .scan_directory(&missing, &ScanOptions::default())
            .expect_err("must reject a missing directory");
        assert!(matches!(err, ScriptdexError::NotFound(_)));
    }

    #[test]
    fn collects_annotated_scripts_and_attaches_provenance() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_script(dir.path(), "backup.sh", "backup");
        write_script(dir.path(), "nested/deploy.py", "deploy");
        fs::write(dir.path().join("notes.txt"), "plain file").expect("write");

        let outcome = CommandScanner::new()
            .scan_directory(dir.path(), &ScanOptions::default())
            .expect("scan");

        assert_eq!(outcome.report.scanned_files, 2);
        assert_eq!(outcome.report.indexed_commands, 2);
        let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"backup") && names.contains(&"deploy"));
        for record in &outcome.records {
            assert!(record.source_path.is_some());
            assert!(record.content_hash.is_some());
        }
    }

    #[test]
    fn unannotated_scripts_are_reported_as_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("plain.sh"), "#!/bin/sh\necho hi\n").expect("write");

        let outcome = CommandScanner::new()
            .scan_directory(dir.path(), &ScanOptions::default())
            .expect("scan");

        assert_eq!(outcome.report.scanned_files, 1);
        assert_eq!(outcome.report.indexed_commands, 0);
        assert_eq!(outcome.report.skipped.len(), 1);
        assert_eq!(outcome.report.coverage_rate(), 0.0);
    }

    #[test]
    fn non_recursive_scan_stays_at_the_top_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_script(dir.path(), "top.sh", "top");
        write_script(dir.path(), "sub/below.sh", "below");

        let options = ScanOptions {
            recursive: false,
            ..ScanOptions::default()
        };
        let outcome = CommandScanner::new()
            .scan_directory(dir.path(), &options)
            .expect("scan");

        assert_eq!(outcome.report.indexed_commands, 1);
        assert_eq!(outcome.records[0].name, "top");
    }

    #[test]
    fn hidden_entries_are_skipped_unless_opted_in() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_script(dir.path(), ".hidden/secret.sh", "secret");
        write_script(dir.path(), "visible.sh", "visible");

        let default = CommandScanner::new()
            .scan_directory(dir.path(), &ScanOptions::default())
            .expect("scan");
        assert_eq!(default.report.indexed_commands, 1);

        let options = ScanOptions {
            include_hidden: true,
            ..ScanOptions::default()
        };
        let opted_in = CommandScanner::new()
            .scan_directory(dir.path(), &options)
            .expect("scan");
        assert_eq!(opted_in.report.indexed_commands, 2);
    }

    #[test]
    fn exclude_globs_filter_by_relative_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_script(dir.path(), "keep.sh", "keep");
        write_script(dir.path(), "vendor/drop.sh", "drop");

        let options = ScanOptions {
            exclude: vec!["vendor/**".to_string()],
            ..ScanOptions::default()
        };
        let outcome = CommandScanner::new()
            .scan_directory(dir.path(), &options)
            .expect("scan");

        assert_eq!(outcome.report.indexed_commands, 1);
        assert_eq!(outcome.records[0].name, "keep");
    }

    #[test]
    fn invalid_exclude_glob_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options = ScanOptions {
            exclude: vec!["a{".to_string()],
            ..ScanOptions::default()
        };
        let err = CommandScanner::new()
            .scan_directory(dir.path(), &options)
            .expect_err("bad glob must be rejected");
        assert!(matches!(err, ScriptdexError::Validation(_)));
    }

    #[cfg(unix)]
    #[test]
    fn extensionless_files_need_the_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let exec_path = dir.path().join("runnable");
        fs::write(&exec_path, ANNOTATED.replace("NAME", "runnable")).expect("write");
        let mut perms = fs::metadata(&exec_path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&exec_path, perms).expect("chmod");

        fs::write(dir.path().join("dataonly"), ANNOTATED.replace("NAME", "dataonly"))
            .expect("write");

        let outcome = CommandScanner::new()
            .scan_directory(dir.path(), &ScanOptions::default())
            .expect("scan");

        let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["runnable"]);
    }
}
