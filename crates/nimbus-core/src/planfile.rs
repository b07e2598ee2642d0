//! On-disk operation-plan format (§6): a versioned envelope wrapping the
//! immutable `Plan` and its `ProgressLog`, written atomically so a crash
//! mid-write never corrupts the file the Plan Runner resumes from.

use crate::error::{CoreError, Result};
use crate::model::{Plan, ProgressLog};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bumped whenever the on-disk shape changes. §6: "format is versioned
/// and survives upgrades between consecutive versions only" — so a file
/// written by version N can be read by N or N+1, never further.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    pub format_version: u32,
    pub plan: Plan,
    pub progress: ProgressLog,
}

impl PlanFile {
    pub fn new(plan: Plan) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            plan,
            progress: ProgressLog::new(),
        }
    }

    pub fn check_version(&self) -> Result<()> {
        if self.format_version == FORMAT_VERSION || self.format_version + 1 == FORMAT_VERSION {
            Ok(())
        } else {
            Err(CoreError::PermanentOperational(format!(
                "operation plan file format v{} is not compatible with current v{}",
                self.format_version, FORMAT_VERSION
            )))
        }
    }

    /// Write atomically: serialise to a temp file in the same directory,
    /// then rename over the target, so a reader never observes a
    /// half-written file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mut file: PlanFile = serde_json::from_slice(&bytes)?;
        file.check_version()?;
        // `PlanArena::index_by_id` is `#[serde(skip)]`, so it comes back
        // empty from `phases` alone; rebuild it before handing the plan
        // back out, or every `index_of`/`phase` lookup on the resumed
        // plan silently returns `None`.
        file.plan.arena.reindex();
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Executor, Phase, PhaseId, PlanArena};

    fn sample_plan() -> Plan {
        let mut arena = PlanArena::new();
        let root = arena
            .insert(Phase::leaf(
                PhaseId::new("/root"),
                Executor::Group,
                serde_json::json!({}),
            ))
            .unwrap();
        Plan {
            operation_id: "op-1".into(),
            cluster_name: "test".into(),
            inventory: vec![],
            installed_app: "app-1.0".into(),
            update_app: "app-1.1".into(),
            arena,
            root,
        }
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let file = PlanFile::new(sample_plan());
        file.save(&path).await.unwrap();

        let loaded = PlanFile::load(&path).await.unwrap();
        assert_eq!(loaded.plan.operation_id, "op-1");
        assert_eq!(loaded.format_version, FORMAT_VERSION);
    }

    #[tokio::test]
    async fn rejects_future_incompatible_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let mut file = PlanFile::new(sample_plan());
        file.format_version = FORMAT_VERSION + 5;
        let bytes = serde_json::to_vec(&file).unwrap();
        tokio::fs::write(&path, bytes).await.unwrap();

        let err = PlanFile::load(&path).await.unwrap_err();
        assert!(matches!(err, CoreError::PermanentOperational(_)));
    }
}
