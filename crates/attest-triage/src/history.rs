//! File-backed priority-history persistence (§6 "Persisted state layout"):
//! `Record<scenarioId, PriorityAssignment[]>`, loaded once and written back
//! atomically after every append.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::assignment::PriorityAssignment;

type HistoryMap = BTreeMap<String, Vec<PriorityAssignment>>;

/// Guards the in-memory map with a mutex so concurrent `analyzePriority`
/// callers see a monotonically growing history and writes never interleave.
pub struct PriorityHistoryStore {
    path: PathBuf,
    history: Mutex<HistoryMap>,
}

impl PriorityHistoryStore {
    /// Loads `path` if it exists, starting from an empty history otherwise.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let history = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read priority history at {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("priority history at {} is not valid JSON", path.display()))?
        } else {
            HistoryMap::new()
        };
        Ok(Self { path, history: Mutex::new(history) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of recorded assignments for `scenario_id`, used to feed
    /// `compute_confidence`'s historical-coverage term.
    pub async fn sample_count(&self, scenario_id: &str) -> usize {
        self.history.lock().await.get(scenario_id).map(Vec::len).unwrap_or(0)
    }

    /// Appends `assignment` and persists the whole history atomically.
    pub async fn record(&self, assignment: PriorityAssignment) -> Result<()> {
        let snapshot = {
            let mut history = self.history.lock().await;
            history.entry(assignment.scenario_id.clone()).or_default().push(assignment);
            history.clone()
        };
        let serialized = serde_json::to_string_pretty(&snapshot).context("failed to serialize priority history")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || attest_core::write_text_atomic(&path, &serialized))
            .await
            .context("priority history write task panicked")??;
        Ok(())
    }
}

/// Resolves the default history path when `config.history_path` is relative:
/// `${cwd}/.priority-history.json` unless an absolute path was configured.
pub fn resolve_history_path(configured: &str) -> PathBuf {
    let configured = Path::new(configured);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(configured)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use attest_core::model::PriorityHint;

    use super::{resolve_history_path, PriorityHistoryStore};
    use crate::assignment::PriorityAssignment;
    use crate::config::TriageConfig;
    use crate::impact::{ImpactContext, InterfaceKind};

    fn sample_context() -> ImpactContext {
        ImpactContext {
            message: "fatal crash in renderer".to_string(),
            category: Some("ui".to_string()),
            tags: BTreeSet::new(),
            interface: InterfaceKind::Ui,
            priority_hint: Some(PriorityHint::Critical),
            failure_rate_7d: 0.2,
            any_pass_30d: false,
        }
    }

    #[tokio::test]
    async fn functional_record_then_reload_round_trips_history() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("history.json");

        let store = PriorityHistoryStore::load(&path).await.expect("load empty");
        store
            .record(PriorityAssignment::new("scenario-a", &TriageConfig::default(), &sample_context(), 0.6, 3.0))
            .await
            .expect("record");
        assert_eq!(store.sample_count("scenario-a").await, 1);

        let reloaded = PriorityHistoryStore::load(&path).await.expect("reload");
        assert_eq!(reloaded.sample_count("scenario-a").await, 1);
    }

    #[tokio::test]
    async fn unit_load_missing_file_starts_empty() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("missing.json");
        let store = PriorityHistoryStore::load(&path).await.expect("load");
        assert_eq!(store.sample_count("anything").await, 0);
    }

    #[test]
    fn unit_relative_history_path_is_joined_with_cwd() {
        let resolved = resolve_history_path(".priority-history.json");
        assert!(resolved.is_absolute());
    }
}
