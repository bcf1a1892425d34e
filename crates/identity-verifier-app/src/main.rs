#![warn(missing_docs)]
//! # identity-verifier binary
//!
//! Command-line entry point: document verification, read-only service views,
//! and the `/api` gateway.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use identity_verifier_app::{
    API_BASE_ENV, AppError, ClientSettings, LogFormat, ORIGIN_ENV, app_version, build_client,
    init_logging, redact_sensitive, summarize_history, summarize_result, summarize_stats,
};
use identity_verifier_client::{DocumentUpload, VerificationClient};
use identity_verifier_endpoints::EndpointSet;
use identity_verifier_gateway::{
    BackendOrigin, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_BODY_BYTES, Gateway, GatewayConfig,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "identity-verifier",
    version = app_version(),
    about = "Identity document verification client and gateway"
)]
struct Cli {
    /// Backend base URL; unset means same-origin.
    #[arg(long, global = true, env = API_BASE_ENV)]
    api_base: Option<String>,

    /// Client-facing origin used to dial same-origin paths.
    #[arg(long, global = true, env = ORIGIN_ENV)]
    origin: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, default_value = "info", env = "IDV_LOG_LEVEL")]
    log_level: String,

    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Human,
        env = "IDV_LOG_FORMAT"
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a document image for verification.
    Verify {
        /// Document image to upload.
        path: PathBuf,
        /// Print the validated result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Query the backend liveness probe.
    Health,
    /// Show aggregate verification counters.
    Stats,
    /// List recent verifications.
    History {
        /// Maximum records to fetch.
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Show one historical verification.
    Show {
        /// Record identifier.
        id: String,
    },
    /// Print the resolved endpoint URLs.
    Endpoints,
    /// Forward `/api/*` calls to the verification backend.
    Gateway {
        /// Address to listen on.
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR, env = "IDV_GATEWAY_LISTEN")]
        listen: SocketAddr,
        /// Backend origin receiving forwarded calls.
        #[arg(long, env = "IDV_BACKEND_URL")]
        backend: String,
        /// Seconds allowed to connect to the backend.
        #[arg(long, default_value_t = 10, env = "IDV_CONNECT_TIMEOUT_SECS")]
        connect_timeout_secs: u64,
        /// Seconds allowed for one forwarded exchange.
        #[arg(long, default_value_t = 120, env = "IDV_REQUEST_TIMEOUT_SECS")]
        request_timeout_secs: u64,
        /// Largest request body forwarded.
        #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "IDV_MAX_BODY_BYTES")]
        max_body_bytes: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = init_logging(cli.log_format, &cli.log_level) {
        eprintln!("identity-verifier: {error}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let message = match error.downcast_ref::<AppError>() {
                Some(app_error) => app_error.user_message(),
                None => format!("{error:#}"),
            };
            error!(error = %redact_sensitive(&format!("{error:#}")), "command failed");
            eprintln!("identity-verifier: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = || -> Result<VerificationClient, AppError> {
        build_client(ClientSettings::resolve(
            cli.api_base.as_deref(),
            cli.origin.as_deref(),
        )?)
    };

    match &cli.command {
        Command::Verify { path, json } => {
            let client = client()?;
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("cannot read document {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());

            let result = client
                .verify(DocumentUpload::new(file_name, bytes))
                .await
                .map_err(AppError::from)?;

            if *json {
                let mut value = serde_json::to_value(&result)?;
                value["riskTier"] = serde_json::Value::from(result.risk_tier().as_str());
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", summarize_result(&result));
            }
        }
        Command::Health => {
            let health = client()?.health().await.map_err(AppError::from)?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::Stats => {
            let stats = client()?.stats().await.map_err(AppError::from)?;
            print!("{}", summarize_stats(&stats));
        }
        Command::History { limit } => {
            let records = client()?
                .recent_verifications(*limit)
                .await
                .map_err(AppError::from)?;
            print!("{}", summarize_history(&records));
        }
        Command::Show { id } => {
            let record = client()?
                .verification_by_id(id)
                .await
                .map_err(AppError::from)?;
            println!("{}  {}  {}", record.id, record.file_name, record.created_at);
            print!("{}", summarize_result(&record.result));
        }
        Command::Endpoints => {
            print_endpoints(client()?.endpoints());
        }
        Command::Gateway {
            listen,
            backend,
            connect_timeout_secs,
            request_timeout_secs,
            max_body_bytes,
        } => {
            let backend = BackendOrigin::parse(backend).map_err(AppError::from)?;
            let mut config = GatewayConfig::new(*listen, backend);
            config.connect_timeout = Duration::from_secs(*connect_timeout_secs);
            config.request_timeout = Duration::from_secs(*request_timeout_secs);
            config.max_body_bytes = *max_body_bytes;
            serve_gateway(config).await?;
        }
    }

    Ok(())
}

fn print_endpoints(endpoints: &EndpointSet) {
    for (name, url) in endpoints.iter() {
        println!("{name:<14} {url}");
    }
}

async fn serve_gateway(config: GatewayConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("cannot listen on {}", config.listen))?;
    let gateway = Gateway::new(&config).map_err(AppError::from)?;

    gateway
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .map_err(AppError::from)?;
    Ok(())
}
