use std::path::PathBuf;
use std::sync::Arc;

use gust::client::LlmClient;
use gust::config::{JobSpec, ModelCatalog};
use gust::error::GustError;
use gust::scheduler;
use gust::table::Table;
use gust::template::Template;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Load .env from the binary's directory first (the job file may live
    // anywhere), falling back to dotenvy's default CWD search.
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
        && dir.join(".env").exists()
    {
        dotenvy::from_path(dir.join(".env")).ok();
    } else {
        dotenvy::dotenv().ok();
    }

    let job_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gust.toml"));

    let (job, config) = JobSpec::load(&job_path)?;

    let catalog = ModelCatalog::from_env();
    // Unmapped model is a startup failure, not N per-row failures.
    if catalog.get(&config.model).is_none() {
        return Err(GustError::Configuration(format!(
            "model {} has no backend mapping (available: {})",
            config.model,
            catalog.model_names().join(", ")
        ))
        .into());
    }

    let template = Template::load(&job.template)?;
    tracing::info!(
        template = %job.template.display(),
        placeholders = ?template.placeholders(),
        "loaded prompt template"
    );

    let table = Table::load_csv(&job.input)?;
    tracing::info!(rows = table.len(), columns = table.columns().len(), "loaded input table");

    let client = Arc::new(LlmClient::new(catalog));
    let (annotated, summary) =
        scheduler::annotate(client, table, &template, &config, &job.output_column).await?;

    annotated.write_csv(&job.output)?;
    println!("{summary}");
    println!("Results saved to: {}", job.output.display());

    Ok(())
}
