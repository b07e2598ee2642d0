//! Plan Runner (§4.G): dispatches a `Plan` honouring dependencies and
//! parent/child sequencing, persisting progress before and after every
//! phase so a crashed run can resume.

use crate::executors::{executor_for, ExecutionContext};
use futures::stream::{FuturesUnordered, StreamExt};
use nimbus_core::model::{Phase, PhaseId, PhaseState, Plan, ProgressLog};
use nimbus_core::planfile::PlanFile;
use nimbus_core::{CoreError, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

pub struct PlanRunner {
    plan: Plan,
    progress: Mutex<ProgressLog>,
    progress_tx: watch::Sender<ProgressLog>,
    ctx: ExecutionContext,
    store_path: PathBuf,
}

impl PlanRunner {
    pub fn new(
        plan: Plan,
        progress: ProgressLog,
        ctx: ExecutionContext,
        store_path: PathBuf,
    ) -> Self {
        let (progress_tx, _) = watch::channel(progress.clone());
        Self {
            plan,
            progress: Mutex::new(progress),
            progress_tx,
            ctx,
            store_path,
        }
    }

    /// Load an existing plan file and resume it, or start a fresh run
    /// if none exists at `store_path`.
    pub async fn load_or_new(plan: Plan, ctx: ExecutionContext, store_path: PathBuf) -> Result<Self> {
        match PlanFile::load(&store_path).await {
            Ok(file) => {
                info!(path = %store_path.display(), "resuming plan from existing store");
                Ok(Self::new(file.plan, file.progress, ctx, store_path))
            }
            Err(_) => Ok(Self::new(plan, ProgressLog::new(), ctx, store_path)),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub async fn progress_snapshot(&self) -> ProgressLog {
        self.progress.lock().await.clone()
    }

    /// A receiver that observes every persisted progress update, for the
    /// read-only observability API (§6) to subscribe to.
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressLog> {
        self.progress_tx.subscribe()
    }

    pub async fn run(&self) -> Result<()> {
        self.run_phase(self.plan.root).await
    }

    /// Reverse-topological rollback: a phase's children roll back
    /// (most-recently-completed first) before the phase's own
    /// `Rollback`, and only phases recorded `Completed` are touched
    /// (§4.G step 5).
    pub async fn rollback(&self) -> Result<()> {
        self.rollback_phase(self.plan.root).await
    }

    async fn persist_state(&self, id: &PhaseId, state: PhaseState) -> Result<()> {
        let mut progress = self.progress.lock().await;
        progress.set_state(id, state);
        self.save_locked(&progress).await
    }

    async fn persist_failed(&self, id: &PhaseId, err: &CoreError) -> Result<()> {
        let mut progress = self.progress.lock().await;
        progress.set_failed(id, err.class(), err.to_string());
        self.save_locked(&progress).await
    }

    async fn save_locked(&self, progress: &ProgressLog) -> Result<()> {
        let file = PlanFile {
            format_version: nimbus_core::planfile::FORMAT_VERSION,
            plan: self.plan.clone(),
            progress: progress.clone(),
        };
        file.save(&self.store_path).await?;
        let _ = self.progress_tx.send(progress.clone());
        Ok(())
    }

    fn phase(&self, idx: usize) -> Phase {
        self.plan.arena.get(idx).clone()
    }

    async fn run_phase(&self, idx: usize) -> Result<()> {
        if self.ctx.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let phase = self.phase(idx);
        let prior_state = self.progress.lock().await.state_of(&phase.id);
        if prior_state == PhaseState::Completed {
            return Ok(());
        }

        // A phase left `InProgress` by a crashed run can only be resumed
        // by re-dispatching it if its executor promises idempotent
        // `execute` (§4.F). Anything else needs a human to look at it.
        if prior_state == PhaseState::InProgress && !phase.executor.is_retryable_on_resume() {
            let err = CoreError::PermanentOperational(format!(
                "phase {} ({}) was left in progress by a previous run and is not safe to resume automatically",
                phase.id, phase.executor
            ));
            warn!(phase = %phase.id, "refusing to resume non-idempotent in-progress phase");
            self.persist_failed(&phase.id, &err).await?;
            return Err(err);
        }

        self.persist_state(&phase.id, PhaseState::InProgress).await?;
        let executor = executor_for(phase.executor);

        if let Err(e) = executor.pre_check(&self.ctx, &phase).await {
            warn!(phase = %phase.id, error = %e, "phase pre-check failed");
            self.persist_failed(&phase.id, &e).await?;
            return Err(e);
        }

        let result = if phase.is_leaf() {
            executor.execute(&self.ctx, &phase).await
        } else {
            self.run_children(&phase).await
        };

        let result = match result {
            Ok(()) if phase.is_leaf() => executor.post_check(&self.ctx, &phase).await,
            other => other,
        };

        match result {
            Ok(()) => {
                self.persist_state(&phase.id, PhaseState::Completed).await?;
                Ok(())
            }
            Err(e) => {
                warn!(phase = %phase.id, error = %e, "phase failed");
                self.persist_failed(&phase.id, &e).await?;
                Err(e)
            }
        }
    }

    /// Sequential children stop dispatch at the first failure (each
    /// depends on its predecessor completing). Bounded-parallel
    /// children are independent siblings: a failure among them does
    /// not stop dispatch of the rest, but the group still reports an
    /// aggregate failure once every dispatched child finishes (§4.F
    /// "Failure policy").
    async fn run_children(&self, phase: &Phase) -> Result<()> {
        match phase.limit_parallel {
            None => {
                for &child in &phase.children {
                    self.run_phase(child).await?;
                }
                Ok(())
            }
            Some(limit) => {
                let limit = limit.max(1);
                let mut remaining: VecDeque<usize> = phase.children.iter().copied().collect();
                let mut in_flight = FuturesUnordered::new();
                let mut first_err = None;

                loop {
                    while in_flight.len() < limit {
                        match remaining.pop_front() {
                            Some(child) => in_flight.push(self.run_phase(child)),
                            None => break,
                        }
                    }
                    if in_flight.is_empty() {
                        break;
                    }
                    if let Some(Err(e)) = in_flight.next().await {
                        if first_err.is_none() {
                            first_err = Some(e);
                        }
                    }
                }

                match first_err {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
        }
    }

    async fn rollback_phase(&self, idx: usize) -> Result<()> {
        let phase = self.phase(idx);

        for &child in phase.children.iter().rev() {
            self.rollback_phase(child).await?;
        }

        let was_completed = {
            let progress = self.progress.lock().await;
            progress.is_completed(&phase.id)
        };
        if !was_completed {
            return Ok(());
        }

        if !phase.executor.rollback_is_noop() {
            let executor = executor_for(phase.executor);
            executor.rollback(&self.ctx, &phase).await?;
        }
        self.persist_state(&phase.id, PhaseState::RolledBack).await
    }
}
