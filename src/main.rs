mod cli;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use examgen::exam::{Exam, ExamStatus, NewExam, SourceFile, UserId};
use examgen::llm::{LlmClient, LlmQuestionGenerator, OfflineGenerator, QuestionGenerator};
use examgen::store::{ExamStore, MemoryExamStore, MemoryPublishedExamStore, MemoryQuestionStore};
use examgen::{
    ExamgenConfig, ExamgenError, GenerationRequest, ReviewService, Scheduler, SchedulerConfig,
    logging,
};
use ui::StatusProgress;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const DEMO_SYLLABUS: &str = "\
The cell is the basic structural unit of all living organisms.
Mitochondria produce most of the chemical energy needed by the cell.
DNA carries the genetic instructions used in growth and reproduction.
Genes are passed from parents to offspring through sexual reproduction.
An ecosystem is a community of organisms interacting with their environment.
Energy flows through an ecosystem from producers to consumers.";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = ExamgenConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            title,
            subjects,
            files,
            count,
            difficulty,
            language,
            publish,
            offline,
        } => {
            let generator: Arc<dyn QuestionGenerator> = if offline {
                Arc::new(OfflineGenerator::default())
            } else {
                remote_generator(&config)?
            };
            let new_exam = NewExam {
                title,
                difficulty,
                subjects,
                language,
                number_of_questions: count,
                created_by: UserId::new(),
                files: read_sources(&files).await?,
                ..Default::default()
            };
            run(&config, generator, new_exam, publish).await
        }

        Command::Demo => {
            let new_exam = NewExam {
                title: "Biology demo quiz".into(),
                description: "Built-in demonstration exam".into(),
                difficulty: "easy".into(),
                subjects: vec!["Cells".into(), "Genetics".into(), "Ecology".into()],
                language: "English".into(),
                number_of_questions: 6,
                created_by: UserId::new(),
                files: vec![SourceFile {
                    original_name: "syllabus.txt".into(),
                    extracted_text: DEMO_SYLLABUS.into(),
                }],
                ..Default::default()
            };
            run(&config, Arc::new(OfflineGenerator::default()), new_exam, true).await
        }
    }
}

fn remote_generator(config: &ExamgenConfig) -> Result<Arc<dyn QuestionGenerator>, ExamgenError> {
    if config.api_key.is_empty() {
        return Err(ExamgenError::Config(
            "no API key: set DEEPSEEK_API_KEY or api_key in examgen.toml, or pass --offline".into(),
        ));
    }
    let client = LlmClient::with_base_url(config.api_key.clone(), &config.base_url)?;
    info!(endpoint = client.endpoint(), model = %config.model, "using remote generator");
    Ok(Arc::new(LlmQuestionGenerator::new(
        client,
        config.model.clone(),
        config.temperature,
    )))
}

async fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        sources.push(SourceFile {
            original_name: file_name(path),
            extracted_text: text,
        });
    }
    Ok(sources)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn run(
    config: &ExamgenConfig,
    generator: Arc<dyn QuestionGenerator>,
    new_exam: NewExam,
    publish: bool,
) -> Result<()> {
    let exams = Arc::new(MemoryExamStore::new());
    let questions = Arc::new(MemoryQuestionStore::new());
    let published = Arc::new(MemoryPublishedExamStore::new());

    let owner = new_exam.created_by;
    let exam = Exam::new(new_exam);
    exams.save(&exam).await?;

    let scheduler = Scheduler::start(
        exams.clone(),
        questions.clone(),
        generator,
        SchedulerConfig::from(config),
    )
    .await?;

    let accepted = scheduler
        .request_generation(exam.id, GenerationRequest::new(owner))
        .await?;
    info!(exam_id = %accepted.exam_id, position = accepted.position, "generation queued");

    let mut progress = StatusProgress::start(&exam.title);
    while scheduler.is_pending(exam.id) {
        progress.observe(scheduler.status(exam.id).await?);
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    let snapshot = scheduler.status(exam.id).await?;
    progress.observe(snapshot.clone());
    progress.finish();
    scheduler.shutdown().await;

    if snapshot.status != ExamStatus::Review {
        bail!("generation did not complete: {}", snapshot.processing_message);
    }

    let review = ReviewService::new(exams, questions, published);
    ui::print_questions(&review.questions(exam.id, owner).await?);

    if publish {
        review.approve_all(exam.id, owner).await?;
        let frozen = review.publish(exam.id, owner).await?;
        ui::print_published(&frozen);
    }

    Ok(())
}
