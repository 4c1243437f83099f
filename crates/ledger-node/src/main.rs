//! ledger-node — the ledger engine's node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Build the Transfer engine, Escrow coordinator, QR flow and Webhook
//!      dispatcher on top of it
//!   3. Spawn the release-worker task (stands in for the CDC/event-stream
//!      plumbing that would drive this in production — see spec §4.3)
//!   4. Start the JSON-RPC 2.0 server

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use ledger_crypto::PlatformKeyPair;
use ledger_rpc::server::RpcServerState;
use ledger_rpc::RpcServer;
use ledger_store::{EscrowCoordinator, QrFlow, ReleaseEvent, StateDb, TransferEngine, WebhookDispatcher};

#[derive(Parser, Debug)]
#[command(
    name = "ledger-node",
    version,
    about = "Multi-tenant ledger and escrow engine node"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.ledger/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Path to the platform's PKCS#1 PEM RSA private key, used to sign
    /// outgoing webhook notifications. Webhooks are sent unsigned if omitted.
    #[arg(long)]
    signing_key: Option<PathBuf>,

    /// Webhook URL used for a tenant that hasn't registered its own.
    #[arg(long, default_value = "https://webhook.example.invalid/notify")]
    default_webhook_url: String,

    /// Default page size for the query surface's unbounded scans, overriding
    /// `ledger_core::DEFAULT_QUERY_LIMIT`.
    #[arg(long)]
    query_page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledger=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("ledger node starting");

    // ── State database ────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    info!(path = %data_dir.display(), "state database opened");

    // ── Signing key ───────────────────────────────────────────────────────
    let signing_key = match &args.signing_key {
        Some(path) => {
            let pem = std::fs::read_to_string(path)
                .with_context(|| format!("reading signing key from {}", path.display()))?;
            Some(Arc::new(PlatformKeyPair::from_pem(pem)))
        }
        None => {
            warn!("no --signing-key provided — webhook notifications will be sent unsigned");
            None
        }
    };

    // ── Coordinators ──────────────────────────────────────────────────────
    let webhook = WebhookDispatcher::new(
        Arc::clone(&db),
        reqwest::Client::new(),
        signing_key,
        args.default_webhook_url,
    );

    let (release_tx, mut release_rx) = tokio::sync::mpsc::channel::<ReleaseEvent>(512);
    let escrow = Arc::new(EscrowCoordinator::new(Arc::clone(&db), webhook, Some(release_tx)));
    let transfer = TransferEngine::new(Arc::clone(&db));
    let qr = QrFlow::new(Arc::clone(&db));

    // ── Release worker ────────────────────────────────────────────────────
    // Stands in for the CDC/event-stream plumbing named out of scope in
    // spec §1: in production this channel's sender is replaced by a
    // consumer polling the stream off the escrow table.
    let release_escrow = Arc::clone(&escrow);
    tokio::spawn(async move {
        while let Some(event) = release_rx.recv().await {
            if let Err(e) = release_escrow.release(event.clone()).await {
                warn!(initiator_uuid = %event.initiator_uuid, error = %e, "escrow release failed");
            }
        }
    });
    info!("release worker spawned");

    let default_query_limit = args.query_page_size.unwrap_or(ledger_core::DEFAULT_QUERY_LIMIT);
    if args.query_page_size.is_some() {
        info!(default_query_limit, "query page size override in effect");
    }

    // ── RPC server ────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState::new(
        Arc::clone(&db),
        transfer,
        escrow,
        qr,
        default_query_limit,
    ));
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;
    info!(addr = %args.rpc_addr, "node ready");

    std::future::pending::<()>().await;
    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
