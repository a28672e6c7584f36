//! Interface de terminal do examgen: spinner e saída colorida.
//!
//! Usa `indicatif` para o spinner e `console` para as cores. O
//! [`StatusProgress`] mostra cada snapshot de status obtido por polling
//! enquanto o job de geração está na fila ou em execução.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use examgen::exam::{ExamStatus, PublishedExam, Question, StatusSnapshot};

/// Spinner que acompanha o status de um exame no terminal.
pub struct StatusProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    dim: Style,
    last: Option<StatusSnapshot>,
}

impl StatusProgress {
    pub fn start(title: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Queued: {title}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
            last: None,
        }
    }

    /// Mostra um snapshot novo. Snapshots repetidos são ignorados; cada
    /// mensagem anterior fica impressa acima do spinner.
    pub fn observe(&mut self, snapshot: StatusSnapshot) {
        if self.last.as_ref() == Some(&snapshot) {
            return;
        }
        if let Some(previous) = self.last.take()
            && !previous.processing_message.is_empty()
        {
            self.pb.println(format!(
                "  {} {}",
                self.dim.apply_to("·"),
                previous.processing_message
            ));
        }
        self.pb
            .set_message(format!("[{}] {}", snapshot.status, snapshot.processing_message));
        self.last = Some(snapshot);
    }

    /// Finaliza o spinner com o último status conhecido.
    ///
    /// Volta para `CREATED` com mensagem `Error: ...` significa falha.
    pub fn finish(self) {
        self.pb.finish_and_clear();
        match &self.last {
            Some(s) if s.status == ExamStatus::Review => {
                println!("  {} {}", self.green.apply_to("✓"), s.processing_message);
            }
            Some(s) => {
                println!(
                    "  {} [{}] {}",
                    self.red.apply_to("✗"),
                    s.status,
                    s.processing_message
                );
            }
            None => println!("  {} no status observed", self.red.apply_to("✗")),
        }
    }
}

/// Imprime as questões geradas agrupadas por assunto, na ordem de inserção.
pub fn print_questions(questions: &[Question]) {
    let heading = Style::new().cyan().bold();
    let dim = Style::new().dim();

    let mut current: Option<&str> = None;
    for (i, q) in questions.iter().enumerate() {
        if current != Some(q.subject.as_str()) {
            println!();
            println!("{}", heading.apply_to(format!("─── {} ───", q.subject)));
            current = Some(q.subject.as_str());
        }
        println!(
            "{:>3}. {} {}",
            i + 1,
            q.text,
            dim.apply_to(format!("({} marks)", q.marks))
        );
    }
}

pub fn print_published(published: &PublishedExam) {
    let green = Style::new().green().bold();
    println!();
    println!(
        "{}",
        green.apply_to(format!(
            "Published {} questions, {} marks total",
            published.questions.len(),
            published.total_marks
        ))
    );
}
