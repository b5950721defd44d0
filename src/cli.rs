//! Command-line entry points: the HTTP server plus the batch and smoke-test
//! commands used when working on the pipeline locally.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::api::{start_server, ApiContext, ApiServer};
use crate::config::Settings;
use crate::generation::{build_provider, generate_with_timeout, GenerationRequest, SamplingParams};
use crate::pipeline::{KnowledgeBase, RawReport, ReportPipeline};
use crate::AppError;

#[derive(Debug, Parser)]
#[command(name = "medexplain", version, about = "Explain medical reports for patients and clinicians")]
pub struct Cli {
    /// Generation backend: `ollama` or `openai`
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Model override for the selected backend
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve {
        /// Listen address, e.g. 127.0.0.1:8000
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run the pipeline over report files or directories of `.txt` reports
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Send a short prompt to the backend and report latency
    Probe,
    /// Print the knowledge-base entry for a term
    Lookup { term: String },
}

impl Cli {
    /// Flag values keyed by the environment variable they override.
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut overrides = HashMap::new();
        if let Some(backend) = &self.backend {
            overrides.insert("MEDEXPLAIN_BACKEND", backend.clone());
        }
        if let Some(model) = &self.model {
            overrides.insert("MEDEXPLAIN_MODEL", model.clone());
        }
        if let Some(Command::Serve { bind: Some(bind) }) = &self.command {
            overrides.insert("MEDEXPLAIN_BIND", bind.to_string());
        }
        overrides
    }
}

pub async fn execute(cli: Cli) -> Result<ExitCode, AppError> {
    let command = cli.command.clone().unwrap_or(Command::Serve { bind: None });

    if let Command::Lookup { term } = &command {
        return lookup(&KnowledgeBase::builtin(), term);
    }

    let settings = Settings::from_env_with(&cli.overrides())?;
    tracing::info!(
        backend = settings.backend.as_str(),
        model = settings.model.as_deref().unwrap_or("auto"),
        "Configuration loaded"
    );

    match command {
        Command::Serve { .. } => serve(&settings).await,
        Command::Analyze { paths } => analyze(&settings, &paths).await,
        Command::Probe => probe(&settings).await,
        Command::Lookup { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn build_pipeline(settings: &Settings) -> Result<ReportPipeline, AppError> {
    let provider = build_provider(settings)?;
    let knowledge_base = KnowledgeBase::builtin();
    tracing::info!(terms = knowledge_base.len(), "Knowledge base loaded");
    Ok(ReportPipeline::new(
        provider,
        Arc::new(knowledge_base),
        settings.generation_timeout,
    ))
}

async fn serve(settings: &Settings) -> Result<ExitCode, AppError> {
    let pipeline = build_pipeline(settings)?;

    // Load the backend before the first request; keep serving if it is not ready yet.
    match pipeline.provider().warm_up().await {
        Ok(()) => tracing::info!(backend = pipeline.provider().name(), "Generation backend initialized"),
        Err(e) => tracing::error!(error = %e, "Failed to initialize generation backend"),
    }

    let server = start_server(
        settings.bind_addr,
        ApiContext::new(pipeline),
        &settings.static_dir,
    )
    .await?;

    serve_until(server, tokio::signal::ctrl_c()).await
}

/// Keep `server` running until `signal` resolves, then drain it. A signal
/// listener that fails still stops the server, and its error is returned.
async fn serve_until<F>(mut server: ApiServer, signal: F) -> Result<ExitCode, AppError>
where
    F: Future<Output = std::io::Result<()>>,
{
    let signal = signal.await;
    match &signal {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
    server.shutdown();
    server.wait().await?;
    signal?;
    Ok(ExitCode::SUCCESS)
}

async fn analyze(settings: &Settings, paths: &[PathBuf]) -> Result<ExitCode, AppError> {
    let reports = discover_reports(paths)?;
    println!("Found {} report(s) to analyze.\n", reports.len());

    let pipeline = build_pipeline(settings)?;
    let mut failures = 0usize;

    for path in &reports {
        println!("--- Report: {} ---", path.display());
        match analyze_one(&pipeline, path).await {
            Ok(()) => {}
            Err(e) => {
                failures += 1;
                tracing::error!(path = %path.display(), error = %e, "Report analysis failed");
                eprintln!("ERROR processing {}: {e}", path.display());
            }
        }
        println!("\n{}\n", "=".repeat(50));
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn analyze_one(pipeline: &ReportPipeline, path: &Path) -> Result<(), AppError> {
    let text = std::fs::read_to_string(path)?;
    let report = RawReport::new(text).map_err(|e| AppError::Command(e.to_string()))?;
    let result = pipeline
        .run(&report)
        .await
        .map_err(|e| AppError::Command(e.to_string()))?;

    println!("\n> PATIENT VIEW:\n{}\n{}", "-".repeat(20), result.patient_explanation);
    println!("\n> CLINICIAN VIEW:\n{}\n{}", "-".repeat(20), result.clinician_explanation);
    println!("\n> CITATIONS FOUND:");
    for url in &result.citations {
        println!("  {url}");
    }
    Ok(())
}

/// Expand directories into their `.txt` files (sorted); keep plain files as given.
pub fn discover_reports(paths: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut reports = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
                .collect();
            found.sort();
            reports.extend(found);
        } else {
            reports.push(path.clone());
        }
    }
    Ok(reports)
}

const PROBE_PROMPT: &str = "What is 2+2?";
const PROBE_PARAMS: SamplingParams = SamplingParams::new(50, 0.7);

async fn probe(settings: &Settings) -> Result<ExitCode, AppError> {
    let provider = build_provider(settings)?;
    println!("Testing backend: {}", provider.name());

    let started = Instant::now();
    let request = GenerationRequest {
        prompt: PROBE_PROMPT,
        system: Some("Answer briefly."),
        params: PROBE_PARAMS,
    };
    let outcome = generate_with_timeout(provider.as_ref(), &request, settings.generation_timeout).await;
    println!("Time taken: {:.2}s", started.elapsed().as_secs_f64());

    match outcome {
        Ok(response) if response.trim().len() > 5 => {
            println!("Response: {response}");
            println!("SUCCESS: Generation worked.");
            Ok(ExitCode::SUCCESS)
        }
        Ok(response) => {
            println!("Response: {response}");
            println!("FAILURE: Response was empty or too short.");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            println!("FAILURE: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn lookup(kb: &KnowledgeBase, term: &str) -> Result<ExitCode, AppError> {
    match kb.resolve(term) {
        Some(record) => {
            let json = serde_json::to_string_pretty(record)
                .map_err(|e| AppError::Command(e.to_string()))?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No knowledge-base entry for '{term}'");
            Ok(ExitCode::FAILURE)
        }
    }
}
