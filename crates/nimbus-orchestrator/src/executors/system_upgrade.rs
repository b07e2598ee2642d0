//! `system-upgrade` — swap the node's runtime/config/teleport packages
//! to the versions the plan's `UpdateServer` calls for. Records the
//! changeset in the local state store before touching services, so
//! rollback can undo precisely that set of swaps whether or not the
//! node rebooted between execute and rollback (§4.F "Key executor
//! details").

use super::{ExecutionContext, PhaseExecutor};
use async_trait::async_trait;
use nimbus_core::model::{PackageRef, Phase, UpdateServer};
use nimbus_core::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Swap {
    before: PackageRef,
    after: PackageRef,
}

pub struct SystemUpgradeExecutor;

#[async_trait]
impl PhaseExecutor for SystemUpgradeExecutor {
    async fn pre_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let update: UpdateServer =
            serde_json::from_value(phase.data.clone()).map_err(nimbus_core::CoreError::Serde)?;

        let mut swaps = Vec::new();
        if update.needs_runtime_update() {
            if let Some(after) = &update.update_runtime {
                swaps.push(Swap {
                    before: update.installed_runtime.clone(),
                    after: after.clone(),
                });
            }
        }
        if update.needs_teleport_update() {
            if let Some(after) = &update.update_teleport {
                swaps.push(Swap {
                    before: update.installed_teleport.clone(),
                    after: after.clone(),
                });
            }
        }
        if let Some(config) = &update.update_config {
            swaps.push(Swap {
                before: update.installed_runtime.clone(),
                after: config.clone(),
            });
        }

        let changeset = serde_json::to_value(&swaps).map_err(nimbus_core::CoreError::Serde)?;
        ctx.records
            .system_upgrade_changesets
            .insert(phase.id.clone(), changeset);

        for swap in &swaps {
            ctx.operator
                .install_package(&update.server, &swap.after, None)
                .await?;
        }
        Ok(())
    }

    async fn rollback(&self, ctx: &ExecutionContext, phase: &Phase) -> Result<()> {
        let update: UpdateServer =
            serde_json::from_value(phase.data.clone()).map_err(nimbus_core::CoreError::Serde)?;
        if let Some((_, changeset)) = ctx.records.system_upgrade_changesets.remove(&phase.id) {
            let swaps: Vec<Swap> =
                serde_json::from_value(changeset).map_err(nimbus_core::CoreError::Serde)?;
            for swap in swaps.iter().rev() {
                ctx.operator
                    .install_package(&update.server, &swap.before, None)
                    .await?;
            }
        }
        Ok(())
    }

    async fn post_check(&self, _ctx: &ExecutionContext, _phase: &Phase) -> Result<()> {
        Ok(())
    }
}
