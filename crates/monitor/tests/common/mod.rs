//! Shared test fixtures: a scripted in-memory [`Backend`].
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use pipewatch_api::{ActionOutcome, ApiError, LogRecord};
use pipewatch_core::job::{Job, JobStatus, RunMeta};
use pipewatch_monitor::Backend;

/// Build a minimal job in the given state.
pub fn test_job(id: &str, status: JobStatus) -> Job {
    Job {
        id: id.to_string(),
        status,
        staged_at: None,
        enqueued_at: None,
        started_at: None,
        ended_at: None,
        meta: RunMeta::default(),
        resources: None,
        error: None,
    }
}

/// One scripted reply for `job_status`.
pub enum Scripted {
    /// Respond with a job in this state (id echoes the request).
    Status(JobStatus),
    NotFound,
    ServerError,
}

/// A [`Backend`] that replays scripted responses and counts fetches.
///
/// When the `job_status` script runs dry, it keeps answering `Running`.
#[derive(Default)]
pub struct ScriptedBackend {
    pub status_script: Mutex<VecDeque<Scripted>>,
    pub status_fetches: AtomicUsize,
    /// When set, `job_status` waits here before replying — lets tests
    /// hold a fetch in flight.
    pub status_gate: Mutex<Option<Arc<Notify>>>,
    pub jobs: Mutex<Vec<Job>>,
    pub history_script: Mutex<VecDeque<Result<Vec<LogRecord>, ApiError>>>,
    pub action_script: Mutex<VecDeque<Result<ActionOutcome, ApiError>>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_status(&self, responses: impl IntoIterator<Item = Scripted>) {
        self.status_script.lock().unwrap().extend(responses);
    }

    pub fn script_history(&self, response: Result<Vec<LogRecord>, ApiError>) {
        self.history_script.lock().unwrap().push_back(response);
    }

    pub fn script_action(&self, response: Result<ActionOutcome, ApiError>) {
        self.action_script.lock().unwrap().push_back(response);
    }

    pub fn set_jobs(&self, jobs: Vec<Job>) {
        *self.jobs.lock().unwrap() = jobs;
    }

    pub fn fetches(&self) -> usize {
        self.status_fetches.load(Ordering::SeqCst)
    }

    fn next_action(&self) -> Result<ActionOutcome, ApiError> {
        self.action_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted action response left")
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);

        let gate = self.status_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self
            .status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Status(JobStatus::Running));

        match scripted {
            Scripted::Status(status) => Ok(test_job(job_id, status)),
            Scripted::NotFound => Err(ApiError::NotFound {
                job_id: job_id.to_string(),
            }),
            Scripted::ServerError => Err(ApiError::Api {
                status: 500,
                body: "engine unavailable".to_string(),
            }),
        }
    }

    async fn log_history(&self, _job_id: &str) -> Result<Vec<LogRecord>, ApiError> {
        self.history_script
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted history response left")
    }

    async fn start_job(&self, _job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.next_action()
    }

    async fn stop_job(&self, _job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.next_action()
    }

    async fn remove_job(&self, _job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.next_action()
    }

    async fn rerun_job(&self, _job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.next_action()
    }
}
