//! Configuração do examgen carregada a partir de `examgen.toml`.
//!
//! A struct [`ExamgenConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `DEEPSEEK_API_KEY` e `DEEPSEEK_BASE_URL` têm
//! precedência sobre o arquivo.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::llm::client::DEFAULT_BASE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "examgen.toml";

/// Configuração de nível superior carregada de `examgen.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExamgenConfig {
    /// Chave da API DeepSeek.
    #[serde(default)]
    pub api_key: String,

    /// URL base do endpoint compatível com chat completions.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Limite por chamada ao gerador, em segundos. Ausente = sem limite.
    #[serde(default)]
    pub generation_timeout_secs: Option<u64>,

    /// Recolocar em `CREATED` exames presos em `PROCESSING` ao iniciar.
    #[serde(default)]
    pub reconcile_on_start: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

// Respostas mais determinísticas para questões de prova.
fn default_temperature() -> f32 {
    0.3
}

impl Default for ExamgenConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            generation_timeout_secs: None,
            reconcile_on_start: false,
        }
    }
}

impl ExamgenConfig {
    /// Carrega a configuração de `path`, ou de `examgen.toml` no diretório atual.
    ///
    /// Usa valores padrão se o arquivo padrão não existir. Um caminho passado
    /// explicitamente precisa existir.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<ExamgenConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Variáveis de ambiente têm precedência sobre o arquivo de configuração.
    /// Valores vazios são ignorados.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("DEEPSEEK_API_KEY")
            && !key.is_empty()
        {
            self.api_key = key;
        }
        if let Some(url) = lookup("DEEPSEEK_BASE_URL")
            && !url.is_empty()
        {
            self.base_url = url;
        }
    }
}
