//! Job tracker vocabulary
//!
//! A journal run reports coarse progress to the external job tracker. The
//! tracker is fire-and-forget: the run never fails because a progress update
//! could not be delivered.

use chrono::{DateTime, Utc};
use core_kernel::{AppId, JobId, TenantDb, UserId};
use serde::{Deserialize, Serialize};

use crate::kind::JournalKind;

/// Progress steps, in the order a run passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStep {
    Start,
    CollectData,
    DeleteOldData,
    GenerateData,
    UpdateStatus,
    End,
}

impl ProgressStep {
    pub const ALL: [ProgressStep; 6] = [
        ProgressStep::Start,
        ProgressStep::CollectData,
        ProgressStep::DeleteOldData,
        ProgressStep::GenerateData,
        ProgressStep::UpdateStatus,
        ProgressStep::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStep::Start => "start",
            ProgressStep::CollectData => "collect-data",
            ProgressStep::DeleteOldData => "delete-old-data",
            ProgressStep::GenerateData => "generate-data",
            ProgressStep::UpdateStatus => "update-status",
            ProgressStep::End => "end",
        }
    }

    /// Coarse completion percentage shown alongside the step
    pub fn progress(&self) -> u8 {
        match self {
            ProgressStep::Start => 0,
            ProgressStep::CollectData => 10,
            ProgressStep::DeleteOldData => 30,
            ProgressStep::GenerateData => 50,
            ProgressStep::UpdateStatus => 80,
            ProgressStep::End => 100,
        }
    }
}

/// Terminal or running state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Running,
    Completed,
    Failed,
}

/// A stored error-log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub url: String,
    pub name: String,
}

/// Task registration sent when a run is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub job_id: JobId,
    pub job_name: String,
    pub kind: JournalKind,
    pub tenant: TenantDb,
    pub app_id: AppId,
    pub user_id: UserId,
    pub steps: Vec<ProgressStep>,
    pub started_at: DateTime<Utc>,
}

/// Progress update for a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub job_id: JobId,
    pub tenant: TenantDb,
    pub step: ProgressStep,
    pub state: TaskState,
    pub progress: u8,
    pub message: String,
    pub error_file: Option<StoredFile>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    pub fn running(job_id: JobId, tenant: TenantDb, step: ProgressStep, message: impl Into<String>) -> Self {
        Self {
            job_id,
            tenant,
            step,
            state: TaskState::Running,
            progress: step.progress(),
            message: message.into(),
            error_file: None,
            finished_at: None,
        }
    }

    pub fn completed(job_id: JobId, tenant: TenantDb, message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Completed,
            finished_at: Some(Utc::now()),
            ..Self::running(job_id, tenant, ProgressStep::End, message)
        }
    }

    /// Terminal failure at the step that failed
    pub fn failed(
        job_id: JobId,
        tenant: TenantDb,
        step: ProgressStep,
        message: impl Into<String>,
        error_file: Option<StoredFile>,
    ) -> Self {
        Self {
            state: TaskState::Failed,
            error_file,
            finished_at: Some(Utc::now()),
            ..Self::running(job_id, tenant, step, message)
        }
    }
}
