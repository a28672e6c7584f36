//! Single-worker FIFO queue for AI question generation.
//!
//! Requests are validated synchronously against the exam record, then
//! handed to one long-lived worker task over an unbounded channel. The
//! worker runs one job at a time, process-wide, in arrival order, and
//! records progress in the exam's `status` / `processing_message` so
//! callers can follow along by polling [`Scheduler::status`].
//!
//! An exam is in the pending set from the moment its job is accepted until
//! the worker is done with it, so a second request for the same exam is
//! refused rather than queued twice.

mod job;
mod worker;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ExamgenConfig;
use crate::error::{ConflictReason, ExamgenError};
use crate::exam::{Exam, ExamId, ExamStatus, QuestionSource, StatusSnapshot};
use crate::llm::QuestionGenerator;
use crate::store::{ExamStore, QuestionStore};

pub use job::{
    Accepted, COMPLETE_MESSAGE, GenerationRequest, JobError, STARTING_MESSAGE, progress_message,
    subject_quota,
};
use job::GenerationJob;
use worker::Worker;

pub const INTERRUPTED_MESSAGE: &str = "Error: generation was interrupted before it finished";

#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Upper bound on one generator call. `None` waits forever.
    pub generation_timeout: Option<Duration>,
    /// Reset exams stuck in `PROCESSING` when the scheduler starts.
    pub reconcile_on_start: bool,
}

impl From<&ExamgenConfig> for SchedulerConfig {
    fn from(config: &ExamgenConfig) -> Self {
        Self {
            generation_timeout: config.generation_timeout_secs.map(Duration::from_secs),
            reconcile_on_start: config.reconcile_on_start,
        }
    }
}

/// Exams with a job queued or running.
#[derive(Debug, Default)]
pub(crate) struct PendingSet {
    ids: Mutex<HashSet<ExamId>>,
}

impl PendingSet {
    fn try_insert(&self, id: ExamId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }

    fn contains(&self, id: ExamId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    pub(crate) fn remove(&self, id: ExamId) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct Scheduler {
    exams: Arc<dyn ExamStore>,
    questions: Arc<dyn QuestionStore>,
    sender: Mutex<Option<UnboundedSender<GenerationJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: Arc<PendingSet>,
}

impl Scheduler {
    /// Spawn the worker task on the current tokio runtime.
    pub async fn start(
        exams: Arc<dyn ExamStore>,
        questions: Arc<dyn QuestionStore>,
        generator: Arc<dyn QuestionGenerator>,
        config: SchedulerConfig,
    ) -> Result<Self, ExamgenError> {
        let pending = Arc::new(PendingSet::default());
        let (sender, receiver) = mpsc::unbounded_channel();

        let scheduler = Self {
            exams: exams.clone(),
            questions: questions.clone(),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(None),
            pending: pending.clone(),
        };

        if config.reconcile_on_start {
            scheduler.reconcile_stuck().await?;
        }

        let worker = Worker {
            exams,
            questions,
            generator,
            generation_timeout: config.generation_timeout,
            pending,
        };
        let handle = tokio::spawn(worker.run(receiver));
        *scheduler
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Ok(scheduler)
    }

    /// Validate and queue a generation run. Returns as soon as the job is queued.
    pub async fn request_generation(
        &self,
        exam_id: ExamId,
        request: GenerationRequest,
    ) -> Result<Accepted, ExamgenError> {
        let exam = self.check_preconditions(exam_id, &request).await?;
        self.reserve(exam.id)?;
        self.submit(exam.id, request)
    }

    /// Delete the exam's AI questions, then queue a fresh run.
    ///
    /// All preconditions of [`Scheduler::request_generation`] are checked and
    /// the queue slot is reserved before anything is deleted.
    pub async fn regenerate_generation(
        &self,
        exam_id: ExamId,
        request: GenerationRequest,
    ) -> Result<Accepted, ExamgenError> {
        let exam = self.check_preconditions(exam_id, &request).await?;
        self.reserve(exam.id)?;

        let purged = match self.questions.delete_where(exam.id, QuestionSource::Ai).await {
            Ok(purged) => purged,
            Err(err) => {
                self.pending.remove(exam.id);
                return Err(err.into());
            }
        };
        info!(%exam_id, purged, "removed previous AI questions");

        self.submit(exam.id, request)
    }

    pub async fn status(&self, exam_id: ExamId) -> Result<StatusSnapshot, ExamgenError> {
        let exam = self
            .exams
            .get(exam_id)
            .await?
            .ok_or(ExamgenError::NotFound(exam_id))?;
        Ok(exam.snapshot())
    }

    /// Jobs queued or running.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, exam_id: ExamId) -> bool {
        self.pending.contains(exam_id)
    }

    /// Put every exam left in `PROCESSING` without a live job back to `CREATED`.
    ///
    /// Returns the number of exams reset.
    pub async fn reconcile_stuck(&self) -> Result<usize, ExamgenError> {
        let stuck = self.exams.find_by_status(ExamStatus::Processing).await?;
        let mut reset = 0;
        for mut exam in stuck {
            if self.pending.contains(exam.id) {
                continue;
            }
            exam.mark_failed(INTERRUPTED_MESSAGE);
            if self.exams.save_unless(&exam, ExamStatus::Published).await? {
                warn!(exam_id = %exam.id, "reset exam stuck in PROCESSING");
                reset += 1;
            }
        }
        Ok(reset)
    }

    /// Stop accepting jobs, let the worker finish what is queued, and wait for it.
    pub async fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && let Err(err) = handle.await
        {
            warn!(error = %err, "generation worker ended abnormally");
        }
    }

    async fn check_preconditions(
        &self,
        exam_id: ExamId,
        request: &GenerationRequest,
    ) -> Result<Exam, ExamgenError> {
        let exam = self
            .exams
            .get(exam_id)
            .await?
            .ok_or(ExamgenError::NotFound(exam_id))?;
        exam.ensure_owned_by(request.requested_by)?;

        match exam.status {
            ExamStatus::Published => {
                return Err(ExamgenError::Conflict(ConflictReason::AlreadyPublished));
            }
            ExamStatus::Processing => {
                return Err(ExamgenError::Conflict(ConflictReason::AlreadyProcessing));
            }
            ExamStatus::Created | ExamStatus::Review => {}
        }
        if self.pending.contains(exam.id) {
            return Err(ExamgenError::Conflict(ConflictReason::AlreadyQueued));
        }
        if !exam.has_source_text() {
            return Err(ExamgenError::InvalidState(
                "no syllabus text available for AI generation".into(),
            ));
        }
        Ok(exam)
    }

    fn reserve(&self, exam_id: ExamId) -> Result<(), ExamgenError> {
        if self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
        {
            return Err(ExamgenError::SchedulerStopped);
        }
        if !self.pending.try_insert(exam_id) {
            return Err(ExamgenError::Conflict(ConflictReason::AlreadyQueued));
        }
        Ok(())
    }

    fn submit(&self, exam_id: ExamId, request: GenerationRequest) -> Result<Accepted, ExamgenError> {
        let sent = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| tx.send(GenerationJob { exam_id, request }).is_ok())
            .unwrap_or(false);
        if !sent {
            self.pending.remove(exam_id);
            return Err(ExamgenError::SchedulerStopped);
        }

        let position = self.pending.len();
        info!(%exam_id, position, "queued AI generation");
        Ok(Accepted { exam_id, position })
    }
}
