//! Stdio entry point for the download orchestrator.
//!
//! Each stdin line is one JSON object: a router request (has `method`) or a
//! context menu click (has `menuItemId`). Replies, broadcasts, and page
//! prompts are written to stdout as JSON lines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use orchestrator_core::config::{load_profile_file, resolve_default_profile_path};
use orchestrator_core::router::{Reply, Responder};
use orchestrator_core::{
    ActivePage, Broadcast, ClickInfo, ConfigurationProfile, ConsoleHost, MemoryEngine,
    Orchestrator, Request, SelectionSnapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

/// A menu click line: the click itself plus the page selection, if any.
#[derive(Debug, Deserialize)]
struct ClickLine {
    #[serde(flatten)]
    info: ClickInfo,
    #[serde(default)]
    selection: Option<SelectionSnapshot>,
}

/// Output line carrying a router reply.
#[derive(Debug, Serialize)]
struct ReplyLine {
    reply_to: &'static str,
    data: Reply,
}

/// The page behind a click line. Prompts are echoed to stdout; confirmation
/// is granted only with `--assume-yes`.
struct StdioPage {
    selection: Option<SelectionSnapshot>,
    assume_yes: bool,
    out: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl ActivePage for StdioPage {
    async fn capture_selection(&self) -> Option<SelectionSnapshot> {
        self.selection.clone()
    }

    async fn confirm(&self, message: &str) -> bool {
        emit(&self.out, &json!({ "confirm": message, "accepted": self.assume_yes }));
        self.assume_yes
    }

    async fn alert(&self, message: &str) {
        emit(&self.out, &json!({ "alert": message }));
    }
}

fn emit(out: &mpsc::UnboundedSender<String>, value: &impl Serialize) {
    match serde_json::to_string(value) {
        Ok(line) => {
            // The writer only goes away at shutdown.
            let _ = out.send(line);
        }
        Err(error) => warn!(error = %error, "failed to encode output line"),
    }
}

/// Writes every broadcast to stdout until `stop` fires, then flushes the
/// broadcasts still queued.
async fn forward_broadcasts(
    mut broadcasts: broadcast::Receiver<Broadcast>,
    out: mpsc::UnboundedSender<String>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = broadcasts.recv() => match received {
                Ok(event) => emit(&out, &event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "stdout fell behind broadcasts"),
                Err(RecvError::Closed) => return,
            },
            _ = &mut stop => break,
        }
    }
    loop {
        match broadcasts.try_recv() {
            Ok(event) => emit(&out, &event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "stdout fell behind broadcasts"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn load_profile(args: &Args) -> Result<ConfigurationProfile> {
    let Some(path) = args.config.clone().or_else(resolve_default_profile_path) else {
        debug!("no profile path; using defaults");
        return Ok(ConfigurationProfile::default());
    };
    load_profile_file(&path).with_context(|| format!("failed to load profile {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let profile = load_profile(&args)?;
    debug!(?profile, "profile loaded");

    let orchestrator = Orchestrator::new(
        Arc::new(MemoryEngine::new()),
        Arc::new(ConsoleHost::new(args.app_name.clone())),
        profile,
        Duration::from_millis(args.poll_interval_ms),
    );

    let (out, mut lines_out) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines_out.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                break;
            }
        }
    });

    let broadcasts = orchestrator.subscribe();
    let (stop_forwarding, stopped) = oneshot::channel::<()>();
    let forwarder = tokio::spawn(forward_broadcasts(broadcasts, out.clone(), stopped));

    orchestrator.startup();
    info!("Orchestrator ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(error) => {
                warn!(error = %error, "skipping unparseable line");
                continue;
            }
        };

        if value.get("method").is_some() {
            let request: Request = match serde_json::from_value(value) {
                Ok(request) => request,
                Err(error) => {
                    debug!(error = %error, "ignoring malformed request");
                    continue;
                }
            };
            let method = request.method();
            let reply_out = out.clone();
            let responder = Responder::from_fn(move |reply| {
                emit(&reply_out, &ReplyLine { reply_to: method, data: reply });
            });
            orchestrator.router().handle_with(request, responder).await;
        } else if value.get("menuItemId").is_some() {
            let click: ClickLine = match serde_json::from_value(value) {
                Ok(click) => click,
                Err(error) => {
                    debug!(error = %error, "ignoring malformed click");
                    continue;
                }
            };
            let page = StdioPage {
                selection: click.selection,
                assume_yes: args.assume_yes,
                out: out.clone(),
            };
            let outcome = orchestrator.menu().on_clicked(&click.info, &page).await;
            debug!(?outcome, "menu click handled");
        } else {
            debug!("ignoring line without method or menuItemId");
        }
    }

    debug!("stdin closed; shutting down");
    orchestrator.shutdown();
    // The forwarder drains what is already queued before it returns.
    let _ = stop_forwarding.send(());
    forwarder.await.context("broadcast forwarder failed")?;
    drop(out);
    writer.await.context("stdout writer failed")?;
    Ok(())
}
