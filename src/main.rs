// Clausewise - command-line entry point
//
// Usage: clausewise <document> [--depth quick|standard|deep] [--compare <second>] [--role <role>]
//
// SSE frames go to stdout; logs and the final claims summary go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use clausewise::models::session::{AnalysisConfig, DepthPreset, SessionRecord};
use clausewise::state::AppState;
use clausewise::storage::ConfigService;

const USAGE: &str =
    "usage: clausewise <document> [--depth quick|standard|deep] [--compare <second>] [--role <role>]";

#[derive(Debug, PartialEq)]
struct CliArgs {
    document: PathBuf,
    compare: Option<PathBuf>,
    depth: DepthPreset,
    role: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut document = None;
    let mut compare = None;
    let mut depth = DepthPreset::default();
    let mut role = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--depth" => {
                let value = args.next().context("--depth needs a value")?;
                depth = value.parse()?;
            }
            "--compare" => {
                compare = Some(PathBuf::from(args.next().context("--compare needs a path")?));
            }
            "--role" => {
                role = Some(args.next().context("--role needs a value")?);
            }
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            _ if document.is_none() => document = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument {}\n{}", arg, USAGE),
        }
    }

    Ok(CliArgs {
        document: document.context(USAGE)?,
        compare,
        depth,
        role,
    })
}

fn read_document(path: &PathBuf) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn run(args: CliArgs) -> anyhow::Result<bool> {
    let config = ConfigService::new()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.get_config().log_filter)),
        )
        .init();

    tracing::info!("Clausewise starting v{}", env!("CARGO_PKG_VERSION"));

    let provider = AppState::build_provider(config.get_config())?;
    let state = AppState::new(config, provider);
    let service = state.analysis_service().await;

    let mut analysis = AnalysisConfig {
        depth: args.depth,
        ..Default::default()
    };
    if let Some(role) = args.role {
        analysis.role = role;
    }

    let document = read_document(&args.document)?;
    let session = match &args.compare {
        Some(second) => SessionRecord::comparison(document, read_document(second)?, analysis)?,
        None => SessionRecord::single(document, analysis)?,
    };
    let session_id = service.create_session(session);

    let (mut frames, report) = service.stream_session(&session_id)?.into_parts();
    let mut stdout = tokio::io::stdout();
    while let Some(frame) = frames.next().await {
        stdout.write_all(&frame).await?;
        stdout.flush().await?;
    }

    let report = report.await.context("analysis task failed")?;
    if !report.claims_summary.is_empty() {
        eprintln!("\n{}", report.claims_summary);
    }
    if let Some(error) = &report.outcome.error {
        eprintln!("analysis failed: {}", error);
    }
    Ok(report.outcome.is_complete())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
