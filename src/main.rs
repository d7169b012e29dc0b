use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voice_stitch::{
    build_dispatcher, create_router, AppState, AudioCodec, Config, DurationAccountant,
    FormatHint, NatsGateway, SymphoniaCodec,
};

#[derive(Parser)]
#[command(name = "voice-stitch")]
#[command(about = "Stitch short voice clips into one recording of up to 60 seconds")]
struct Cli {
    /// Config file (extension optional; missing file falls back to defaults)
    #[arg(short, long, default_value = "config/voice-stitch")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway, plus the NATS bridge when configured
    Serve,

    /// Print how many seconds a local audio file counts for
    Measure {
        file: PathBuf,

        /// Container extension; taken from the file name when omitted
        #[arg(short, long)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Measure { file, format } => measure(file, format),
    }
}

async fn serve(cfg: Config) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let session_config = cfg.session_config();
    info!("Storage root: {}", session_config.storage_root.display());

    let codec: Arc<dyn AudioCodec> = Arc::new(SymphoniaCodec::new());
    let replies = Arc::new(cfg.replies.clone());
    let dispatcher = build_dispatcher(&session_config, codec, Arc::clone(&replies))?;

    if let Some(url) = &cfg.nats.url {
        let gateway = Arc::new(
            NatsGateway::connect(url, cfg.nats.outbound_prefix.clone(), Arc::clone(&replies))
                .await?,
        );
        let subject = cfg.nats.inbound_subject.clone();
        let dispatcher = Arc::clone(&dispatcher);

        tokio::spawn(async move {
            if let Err(e) = gateway.serve(subject, dispatcher).await {
                error!("NATS bridge stopped: {:#}", e);
            }
        });
    } else {
        info!("NATS bridge disabled (no nats.url configured)");
    }

    let router = create_router(AppState::new(dispatcher), cfg.service.http.max_body_bytes);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

fn measure(file: PathBuf, format: Option<String>) -> Result<()> {
    let bytes = std::fs::read(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let hint = match format {
        Some(ext) => FormatHint::extension(ext),
        None => FormatHint::from_file_name(file.file_name().and_then(|n| n.to_str())),
    };

    let accountant = DurationAccountant::new(Arc::new(SymphoniaCodec::new()));
    let seconds = accountant.measure(&bytes, &hint)?;

    println!("{}: {} seconds", file.display(), seconds);
    Ok(())
}
