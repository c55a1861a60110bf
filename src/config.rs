use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::GustError;

/// Bounds for the requests-per-minute setting. Values outside this
/// range fail construction — they are never clamped.
pub const RPM_MIN: u32 = 1;
pub const RPM_MAX: u32 = 100;

/// Immutable run parameters, validated once at construction.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    pub temperature: f64,
    pub max_workers: usize,
    pub requests_per_minute: u32,
}

impl RunConfig {
    pub fn new(
        model: impl Into<String>,
        temperature: f64,
        max_workers: usize,
        requests_per_minute: u32,
    ) -> Result<Self, GustError> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(GustError::Configuration(format!(
                "invalid temperature: {temperature} (must be within 0.0..=1.0)"
            )));
        }
        if max_workers < 1 {
            return Err(GustError::Configuration(format!(
                "invalid max_workers: {max_workers} (must be >= 1)"
            )));
        }
        if !(RPM_MIN..=RPM_MAX).contains(&requests_per_minute) {
            return Err(GustError::Configuration(format!(
                "invalid requests_per_minute: {requests_per_minute} (must be within {RPM_MIN}..={RPM_MAX})"
            )));
        }
        Ok(Self {
            model: model.into(),
            temperature,
            max_workers,
            requests_per_minute,
        })
    }
}

/// One resolvable completion backend. The catalog key is the model name
/// callers use; `model_id` is what goes on the wire (e.g. a deployment
/// name that differs from the public alias).
#[derive(Clone)]
pub struct ModelEntry {
    pub model_id: String,
    pub provider: String,
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEntry")
            .field("model_id", &self.model_id)
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Explicit model-name → backend map, built once from the environment.
/// Replaces any notion of process-global provider state: the catalog is
/// constructed at startup and passed by reference from then on.
pub struct ModelCatalog {
    models: HashMap<String, ModelEntry>,
}

impl ModelCatalog {
    pub fn from_env() -> Self {
        let azure_endpoint = env::var("AZURE_OPENAI_ENDPOINT").ok();
        let azure_key = env::var("AZURE_OPENAI_API_KEY").ok();
        let openai_key = env::var("OPENAI_API_KEY").ok();

        let mut models = HashMap::new();

        match (azure_endpoint, azure_key) {
            (Some(endpoint), Some(key)) => {
                models.insert(
                    "gpt-4o".to_string(),
                    ModelEntry {
                        model_id: "gpt-4o".to_string(),
                        provider: "azure".to_string(),
                        base_url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
                        api_key: key,
                    },
                );
            }
            _ => {
                tracing::warn!(
                    "AZURE_OPENAI_ENDPOINT / AZURE_OPENAI_API_KEY not set — azure models unavailable"
                );
            }
        }

        if let Some(key) = openai_key {
            for name in ["gpt-4o-mini", "gpt-4.1"] {
                models.insert(
                    name.to_string(),
                    ModelEntry {
                        model_id: name.to_string(),
                        provider: "openai".to_string(),
                        base_url: "https://api.openai.com/v1/chat/completions".to_string(),
                        api_key: key.clone(),
                    },
                );
            }
        } else {
            tracing::warn!("OPENAI_API_KEY not set — openai models unavailable");
        }

        if models.is_empty() {
            tracing::error!("no completion backends configured — every run will fail");
        }

        Self { models }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, ModelEntry)>) -> Self {
        Self {
            models: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, model: &str) -> Option<&ModelEntry> {
        self.models.get(model)
    }

    /// Registered model names, sorted for stable log output.
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// On-disk run manifest. Paths are resolved relative to the manifest's
/// own directory so a job directory can be moved as a unit.
#[derive(Debug, Deserialize)]
struct JobFile {
    job: JobSection,
    run: RunSection,
}

#[derive(Debug, Deserialize)]
struct JobSection {
    template: PathBuf,
    input: PathBuf,
    output: PathBuf,
    output_column: String,
}

#[derive(Debug, Deserialize)]
struct RunSection {
    model: String,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default = "default_max_workers")]
    max_workers: usize,
    #[serde(default = "default_requests_per_minute")]
    requests_per_minute: u32,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_workers() -> usize {
    5
}

fn default_requests_per_minute() -> u32 {
    60
}

/// Validated job description: where to read, where to write, what to call.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub template: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub output_column: String,
}

impl JobSpec {
    /// Load and validate a TOML job manifest, returning the job paths and
    /// the run parameters. Any violation is a fatal configuration error.
    pub fn load(path: &Path) -> Result<(Self, RunConfig), GustError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GustError::Configuration(format!("failed to read job file {}: {e}", path.display()))
        })?;
        let file: JobFile = toml::from_str(&raw).map_err(|e| {
            GustError::Configuration(format!("failed to parse job file {}: {e}", path.display()))
        })?;

        if file.job.output_column.is_empty() {
            return Err(GustError::Configuration(
                "output_column must not be empty".to_string(),
            ));
        }

        let config = RunConfig::new(
            file.run.model,
            file.run.temperature,
            file.run.max_workers,
            file.run.requests_per_minute,
        )?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let spec = JobSpec {
            template: base.join(file.job.template),
            input: base.join(file.job.input),
            output: base.join(file.job.output),
            output_column: file.job.output_column,
        };
        Ok((spec, config))
    }
}
