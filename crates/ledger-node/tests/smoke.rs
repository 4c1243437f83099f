//! End-to-end smoke test for ledger-node.
//!
//! Starts a real node process against a fresh data directory, drives the
//! JSON-RPC surface, and asserts state changes are correctly reflected.
//!
//! Run with:
//!   cargo test -p ledger-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

// ── Node lifecycle ──────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

// ── RPC helpers ──────────────────────────────────────────────────────────────

async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "ledger_getAccount",
        "params": ["nil", "__probe__"],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

async fn create_account(client: &reqwest::Client, url: &str, tenant_id: &str, account_id: &str, initial_amount: &str) {
    rpc_call(
        client,
        url,
        "ledger_createAccount",
        serde_json::json!([{
            "tenant_id": tenant_id,
            "account_id": account_id,
            "initial_amount": initial_amount,
        }]),
    )
    .await;
}

async fn balance(client: &reqwest::Client, url: &str, tenant_id: &str, account_id: &str) -> String {
    rpc_call(
        client,
        url,
        "ledger_inquireBalance",
        serde_json::json!([tenant_id, account_id]),
    )
    .await
    .as_str()
    .expect("balance string")
    .to_string()
}

fn start_node(data_dir: &std::path::Path, rpc_port: u16) -> NodeGuard {
    let node_bin = env!("CARGO_BIN_EXE_ledger-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",
            data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",
            &format!("127.0.0.1:{}", rpc_port),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn ledger-node");
    NodeGuard {
        child,
        data_dir: data_dir.to_path_buf(),
    }
}

// ── Scenario 1: happy-path transfer ─────────────────────────────────────────

#[tokio::test]
async fn happy_path_transfer_moves_funds() {
    let data_dir = std::env::temp_dir().join(format!("ledger_e2e_transfer_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);
    let _guard = start_node(&data_dir, rpc_port);

    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "ledger-node did not become ready within 20 seconds"
    );

    create_account(&http, &rpc_url, "nil", "249_ACCT_1", "121336038").await;
    create_account(&http, &rpc_url, "nil", "0111493888", "0").await;

    let response = rpc_call(
        &http,
        &rpc_url,
        "ledger_transfer",
        serde_json::json!([{
            "tenant_id": "nil",
            "from_account": "249_ACCT_1",
            "to_account": "0111493888",
            "amount": "10000",
            "initiator_uuid": "smoke-happy-path",
        }]),
    )
    .await;
    assert_eq!(response["code"], "successful_transaction");

    assert_eq!(balance(&http, &rpc_url, "nil", "249_ACCT_1").await, "121326038.00");
    assert_eq!(balance(&http, &rpc_url, "nil", "0111493888").await, "10000.00");
}

// ── Scenario 6: escrow local cash-out ───────────────────────────────────────

#[tokio::test]
async fn escrow_local_cashout_settles_and_completes() {
    let data_dir = std::env::temp_dir().join(format!("ledger_e2e_escrow_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);
    let _guard = start_node(&data_dir, rpc_port);

    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "ledger-node did not become ready within 20 seconds"
    );

    create_account(&http, &rpc_url, "nonil", "0111493885", "1").await;
    create_account(&http, &rpc_url, "nil", "0965256869", "0").await;
    create_account(&http, &rpc_url, "ESCROW_TENANT", "NIL_ESCROW_ACCOUNT", "0").await;

    let escrow_tx = rpc_call(
        &http,
        &rpc_url,
        "ledger_escrowRequest",
        serde_json::json!([{
            "from_account": "0111493885",
            "from_tenant_id": "nonil",
            "to_account": "0965256869",
            "to_tenant_id": "nil",
            "amount": "1",
            "initiator_uuid": "fff",
            "cashout_provider": "nil",
            "service_provider": "acme@example.com",
        }]),
    )
    .await;
    assert_eq!(escrow_tx["status"], "InProgress");

    // The release worker runs off-loop; give it a moment to settle.
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut completed = serde_json::Value::Null;
    while Instant::now() < deadline {
        let row = rpc_call(&http, &rpc_url, "ledger_getEscrowTransaction", serde_json::json!(["fff"])).await;
        if row["status"] == "Completed" {
            completed = row;
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    assert_eq!(completed["status"], "Completed", "escrow transaction should reach COMPLETED");

    assert_eq!(balance(&http, &rpc_url, "nonil", "0111493885").await, "0.00");
    assert_eq!(balance(&http, &rpc_url, "nil", "0965256869").await, "1.00");
    assert_eq!(balance(&http, &rpc_url, "ESCROW_TENANT", "NIL_ESCROW_ACCOUNT").await, "0.00");
}
