//! Interface de linha de comando do examgen baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (generate, demo)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// examgen: geração de questões de prova por IA, em fila, com revisão do professor.
#[derive(Debug, Parser)]
#[command(name = "examgen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Arquivo de configuração (padrão: ./examgen.toml, se existir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Gera questões a partir de arquivos de texto do conteúdo programático.
    Generate {
        /// Título do exame.
        title: String,

        /// Assunto a cobrir; repita para vários.
        #[arg(long = "subject", short = 's', required = true)]
        subjects: Vec<String>,

        /// Arquivo de texto com o conteúdo; repita para vários.
        #[arg(long = "file", short = 'f', required = true)]
        files: Vec<PathBuf>,

        /// Número total de questões pedidas.
        #[arg(long, short = 'n', default_value_t = 10)]
        count: u32,

        #[arg(long, default_value = "medium")]
        difficulty: String,

        #[arg(long, default_value = "English")]
        language: String,

        /// Aprova tudo e publica o exame ao final.
        #[arg(long, default_value_t = false)]
        publish: bool,

        /// Usa o gerador local em vez da API.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },

    /// Executa a demonstração embutida com o gerador local.
    Demo,
}
