use search_share::{trend_for, Snapshot, SnapshotTrend};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Append-only snapshot history per project, persisted as one JSON document.
///
/// Appends for every project go through one lock, which keeps each
/// project's timestamps in creation order.
pub struct SnapshotHistory {
    path: PathBuf,
    projects: Mutex<BTreeMap<String, Vec<Snapshot>>>,
}

impl SnapshotHistory {
    pub async fn load(path: PathBuf) -> Result<Self, String> {
        let projects = if path.exists() {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| format!("failed to read history: {}", err))?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)
                    .map_err(|err| format!("failed to parse history: {}", err))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            projects: Mutex::new(projects),
        })
    }

    pub async fn history(&self, project_id: &str) -> Vec<Snapshot> {
        let guard = self.projects.lock().await;
        guard.get(project_id).cloned().unwrap_or_default()
    }

    pub async fn latest(&self, project_id: &str) -> Option<Snapshot> {
        let guard = self.projects.lock().await;
        guard.get(project_id).and_then(|history| history.last()).cloned()
    }

    /// Builds the snapshot while holding the lock and appends it. Returns the
    /// stored snapshot and its trend against the previous one.
    pub async fn append<F>(
        &self,
        project_id: &str,
        build: F,
    ) -> Result<(Snapshot, Option<SnapshotTrend>), String>
    where
        F: FnOnce() -> Snapshot,
    {
        let mut guard = self.projects.lock().await;
        let snapshot = build();
        let history = guard.entry(project_id.to_string()).or_default();
        history.push(snapshot.clone());
        let trend = trend_for(history.as_slice());
        let count = history.len();

        if let Err(err) = self.persist(&guard).await {
            if let Some(history) = guard.get_mut(project_id) {
                history.pop();
                if history.is_empty() {
                    guard.remove(project_id);
                }
            }
            return Err(err);
        }

        tracing::info!(project_id, snapshots = count, date = %snapshot.date, "appended snapshot");
        Ok((snapshot, trend))
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<bool, String> {
        let mut guard = self.projects.lock().await;
        let Some(removed) = guard.remove(project_id) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&guard).await {
            guard.insert(project_id.to_string(), removed);
            return Err(err);
        }
        tracing::info!(project_id, snapshots = removed.len(), "deleted project history");
        Ok(true)
    }

    async fn persist(&self, projects: &BTreeMap<String, Vec<Snapshot>>) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(projects)
            .map_err(|err| format!("failed to serialize history: {}", err))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|err| format!("failed to write history: {}", err))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| format!("failed to finalize history: {}", err))?;
        Ok(())
    }
}

async fn ensure_dir(path: &Path) -> Result<(), String> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| format!("failed to create history dir: {}", err))
}
