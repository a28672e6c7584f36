use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::PendingSet;
use super::job::{
    COMPLETE_MESSAGE, GenerationJob, JobError, JobOutcome, STARTING_MESSAGE, SkipReason,
    progress_message, subject_quota,
};
use crate::exam::{Exam, ExamId, ExamStatus, QuestionDraft};
use crate::llm::{GeneratedQuestion, GenerationParams, QuestionGenerator};
use crate::store::{ExamStore, QuestionStore};

/// The single consumer of the generation queue.
pub(crate) struct Worker {
    pub(crate) exams: Arc<dyn ExamStore>,
    pub(crate) questions: Arc<dyn QuestionStore>,
    pub(crate) generator: Arc<dyn QuestionGenerator>,
    pub(crate) generation_timeout: Option<Duration>,
    pub(crate) pending: Arc<PendingSet>,
}

impl Worker {
    /// Run jobs in arrival order until every sender is gone and the queue is drained.
    pub(crate) async fn run(self, mut jobs: UnboundedReceiver<GenerationJob>) {
        while let Some(job) = jobs.recv().await {
            let exam_id = job.exam_id;
            let span = info_span!("generation_job", %exam_id);
            self.process(job).instrument(span).await;
            self.pending.remove(exam_id);
        }
        debug!("generation queue closed, worker exiting");
    }

    async fn process(&self, job: GenerationJob) {
        let waited = Utc::now() - job.request.requested_at;
        info!(
            requested_by = %job.request.requested_by,
            waited_ms = waited.num_milliseconds(),
            "starting AI generation job"
        );

        let result = AssertUnwindSafe(self.execute_job(&job))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(JobError::Panicked(panic_message(&*panic))));

        match result {
            Ok(JobOutcome::Completed { questions }) => {
                info!(questions, "AI generation complete");
            }
            Ok(JobOutcome::Skipped(SkipReason::ExamMissing)) => {
                warn!("exam no longer exists, dropping generation job");
            }
            Ok(JobOutcome::Skipped(SkipReason::ExamPublished)) => {
                warn!("exam was published before the job could write, dropping generation job");
            }
            Err(err) => {
                error!(error = %err, "AI generation failed");
                self.revert(job.exam_id, &err).await;
            }
        }
    }

    async fn execute_job(&self, job: &GenerationJob) -> Result<JobOutcome, JobError> {
        let Some(mut exam) = self.exams.get(job.exam_id).await? else {
            return Ok(JobOutcome::Skipped(SkipReason::ExamMissing));
        };
        if exam.status == ExamStatus::Published {
            return Ok(JobOutcome::Skipped(SkipReason::ExamPublished));
        }

        exam.transition(ExamStatus::Processing, STARTING_MESSAGE)?;
        if !self.persist(&exam).await? {
            return Ok(JobOutcome::Skipped(SkipReason::ExamPublished));
        }

        let corpus = exam.combined_text();
        let subjects = exam.subjects.clone();
        let quota = subject_quota(exam.number_of_questions, subjects.len());
        let mut inserted = 0;

        for (i, subject) in subjects.iter().enumerate() {
            exam.set_processing_message(progress_message(subject, i + 1, subjects.len()));
            if !self.persist(&exam).await? {
                return Ok(JobOutcome::Skipped(SkipReason::ExamPublished));
            }

            let params = GenerationParams {
                text: corpus.clone(),
                difficulty: exam.difficulty.clone(),
                subjects: vec![subject.clone()],
                count: quota,
                language: exam.language.clone(),
            };
            let generated = self
                .generate(&params)
                .instrument(info_span!("subject", %subject, quota))
                .await?;

            let drafts = generated
                .into_iter()
                .map(|q| QuestionDraft::ai(&exam, q))
                .collect();
            let stored = self.questions.insert_many(drafts).await?;
            debug!(%subject, stored = stored.len(), "stored generated questions");
            inserted += stored.len();
        }

        exam.transition(ExamStatus::Review, COMPLETE_MESSAGE)?;
        if !self.persist(&exam).await? {
            return Ok(JobOutcome::Skipped(SkipReason::ExamPublished));
        }

        Ok(JobOutcome::Completed {
            questions: inserted,
        })
    }

    /// Whole-document write that never replaces a published exam.
    /// `Ok(false)` means the exam was published since it was read.
    async fn persist(&self, exam: &Exam) -> Result<bool, JobError> {
        Ok(self.exams.save_unless(exam, ExamStatus::Published).await?)
    }

    async fn generate(&self, params: &GenerationParams) -> Result<Vec<GeneratedQuestion>, JobError> {
        let call = self.generator.generate(params);
        match self.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| JobError::Timeout(limit))?
                .map_err(JobError::from),
            None => Ok(call.await?),
        }
    }

    /// Best effort: a failed write here is logged and the exam is left as it is.
    async fn revert(&self, exam_id: ExamId, err: &JobError) {
        let mut exam = match self.exams.get(exam_id).await {
            Ok(Some(exam)) => exam,
            Ok(None) => {
                warn!("exam disappeared before its failure could be recorded");
                return;
            }
            Err(store_err) => {
                error!(error = %store_err, "could not reload exam to record failure");
                return;
            }
        };

        exam.mark_failed(err.status_message());
        match self.exams.save_unless(&exam, ExamStatus::Published).await {
            Ok(true) => {}
            Ok(false) => warn!("exam was published meanwhile, failure not recorded"),
            Err(store_err) => {
                error!(error = %store_err, "could not revert exam status after failure");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
