//! Job progress reporting
//!
//! Tracker calls never fail a run. A failed update is logged at `warn` and
//! the run carries on.

use std::sync::Arc;

use core_kernel::{JobId, TenantDb};
use domain_journal::{ProgressStep, StoredFile, TaskSpec, TaskTrackerPort, TaskUpdate};
use tracing::{debug, warn};

/// Reports the progress of one job
#[derive(Clone)]
pub struct ProgressReporter {
    tracker: Arc<dyn TaskTrackerPort>,
    job_id: JobId,
    tenant: TenantDb,
}

impl ProgressReporter {
    pub fn new(tracker: Arc<dyn TaskTrackerPort>, job_id: JobId, tenant: TenantDb) -> Self {
        Self {
            tracker,
            job_id,
            tenant,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Registers the task with the tracker
    pub async fn register(&self, task: &TaskSpec) {
        if let Err(error) = self.tracker.create_task(task).await {
            warn!(job_id = %self.job_id, error = %error, "Could not register task");
        }
    }

    pub async fn step(&self, step: ProgressStep, message: impl Into<String>) {
        debug!(job_id = %self.job_id, step = step.as_str(), "Progress");
        self.send(TaskUpdate::running(self.job_id, self.tenant.clone(), step, message))
            .await;
    }

    pub async fn completed(&self, message: impl Into<String>) {
        self.send(TaskUpdate::completed(self.job_id, self.tenant.clone(), message))
            .await;
    }

    pub async fn failed(&self, step: ProgressStep, message: impl Into<String>, error_file: Option<StoredFile>) {
        self.send(TaskUpdate::failed(
            self.job_id,
            self.tenant.clone(),
            step,
            message,
            error_file,
        ))
        .await;
    }

    async fn send(&self, update: TaskUpdate) {
        if let Err(error) = self.tracker.update_task(&update).await {
            warn!(
                job_id = %self.job_id,
                step = update.step.as_str(),
                error = %error,
                "Could not update task"
            );
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("job_id", &self.job_id)
            .field("tenant", &self.tenant)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_journal::ports::mock::MockTaskTracker;
    use domain_journal::TaskState;

    #[tokio::test]
    async fn test_updates_carry_step_progress() {
        let tracker = MockTaskTracker::new();
        let reporter = ProgressReporter::new(Arc::new(tracker.clone()), JobId::new(), TenantDb::new("t"));

        reporter.step(ProgressStep::GenerateData, "generating").await;
        reporter.completed("done").await;

        let updates = tracker.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].progress, 50);
        assert_eq!(updates[0].state, TaskState::Running);
        assert_eq!(updates[1].step, ProgressStep::End);
        assert_eq!(updates[1].state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_tracker_failures_are_swallowed() {
        let tracker = MockTaskTracker::failing();
        let reporter = ProgressReporter::new(Arc::new(tracker), JobId::new(), TenantDb::new("t"));

        reporter.step(ProgressStep::Start, "start").await;
        reporter.failed(ProgressStep::Start, "boom", None).await;
    }
}
