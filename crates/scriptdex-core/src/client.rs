use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ScriptdexConfig;
use crate::error::{Result, ScriptdexError};
use crate::models::{CommandRecord, IndexStatus, QueryOutcome, ScanReport};
use crate::providers::{ProviderRegistry, SemanticProvider};
use crate::query::QueryEngine;
use crate::scan::{CommandScanner, ScanOptions, ScanOutcome};
use crate::snapshot::SnapshotFile;
use crate::store::CommandStore;

/// Top-level facade over the store, the snapshot file, and the optional
/// semantic provider. Opening loads the persisted index when present and
/// builds the configured provider; a provider that fails to construct is
/// remembered as a note and the runtime degrades to local-only search.
pub struct Scriptdex {
    config: ScriptdexConfig,
    store: CommandStore,
    snapshot: SnapshotFile,
    engine: QueryEngine,
    provider_error: Option<String>,
}

impl std::fmt::Debug for Scriptdex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scriptdex")
            .field("root", &self.config.root)
            .field("provider", &self.engine.provider_id())
            .finish_non_exhaustive()
    }
}

impl Scriptdex {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let config = ScriptdexConfig::load(&root)?;
        Self::with_config(config)
    }

    pub fn with_config(config: ScriptdexConfig) -> Result<Self> {
        let snapshot = SnapshotFile::new(config.snapshot_path.clone());
        let store = match snapshot.load()? {
            Some(blob) => CommandStore::from_snapshot(blob),
            None => CommandStore::new(),
        };

        let (engine, provider_error) = if config.semantic_enabled {
            match ProviderRegistry::with_builtins().build(&config.provider, config.timeout_ms) {
                Ok(provider) => (QueryEngine::with_provider(provider), None),
                Err(err) => (QueryEngine::new(), Some(err.to_string())),
            }
        } else {
            (QueryEngine::new(), None)
        };

        Ok(Self {
            config,
            store,
            snapshot,
            engine,
            provider_error,
        })
    }

    /// Swaps in a provider directly, bypassing the registry, and turns the
    /// semantic stage on. Embedders and tests use this to drive the pipeline
    /// with their own backend.
    pub fn set_provider(&mut self, provider: Box<dyn SemanticProvider>) {
        self.engine = QueryEngine::with_provider(provider);
        self.provider_error = None;
        self.config.semantic_enabled = true;
    }

    /// Scan defaults from config; per-invocation flags layer on top.
    #[must_use]
    pub fn scan_defaults(&self) -> ScanOptions {
        ScanOptions {
            recursive: true,
            include_hidden: self.config.scan_include_hidden,
            exclude: self.config.scan_exclude.clone(),
        }
    }

    /// Scans a directory, indexes every valid command, and persists the
    /// updated snapshot.
    pub fn scan(&mut self, directory: &Path, options: &ScanOptions) -> Result<ScanReport> {
        let ScanOutcome { records, report } =
            CommandScanner::new().scan_directory(directory, options)?;
        self.store.insert_batch(records);
        self.save()?;
        Ok(report)
    }

    pub fn insert(&mut self, record: CommandRecord) {
        self.store.insert(record);
    }

    #[must_use]
    pub fn query(&self, text: &str, use_semantic: bool) -> QueryOutcome {
        let semantic_wanted = use_semantic && self.config.semantic_enabled;
        let mut outcome = self.engine.query(&self.store, text, semantic_wanted);
        // The semantic stage would have run but the provider never came up;
        // surface the construction failure as the stage's note.
        if semantic_wanted && outcome.hits.is_empty() && outcome.semantic_failure.is_none() {
            outcome.semantic_failure = self.provider_error.clone();
        }
        outcome
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandRecord> {
        self.store.get(name)
    }

    pub fn explain(&self, name: &str) -> Result<String> {
        let record = self
            .store
            .get(name)
            .ok_or_else(|| ScriptdexError::NotFound(format!("command not found: {name}")))?;
        self.engine.explain(record)
    }

    #[must_use]
    pub fn status(&self) -> IndexStatus {
        IndexStatus {
            stats: self.store.stats(),
            snapshot_path: self.snapshot.path().display().to_string(),
            provider: self.engine.provider_id().map(ToString::to_string),
            provider_error: self.provider_error.clone(),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.snapshot.save(&self.store.snapshot())
    }

    #[must_use]
    pub fn store(&self) -> &CommandStore {
        &self.store
    }

    #[must_use]
    pub fn store_mut(&mut self) -> &mut CommandStore {
        &mut self.store
    }

    #[must_use]
    pub fn config(&self) -> &ScriptdexConfig {
        &self.config
    }
}
