//! IPFS content backend.
//!
//! Talks to a Kubo node over its HTTP RPC API:
//!
//! ```text
//! POST /api/v0/add?pin=true            (multipart, field "file")
//!   -> {"Name": "...", "Hash": "<cid>", "Size": "123"}
//!
//! POST /api/v0/cat?arg=<cid>
//!   -> raw bytes
//!
//! POST /api/v0/files/stat?arg=/ipfs/<cid>
//!   -> {"Hash": "<cid>", "Size": 10, "CumulativeSize": 21, "Blocks": 0, "Type": "file"}
//!
//! POST /api/v0/pin/add?arg=<cid>       POST /api/v0/pin/rm?arg=<cid>
//!   -> {"Pins": ["<cid>"]}
//! ```
//!
//! Every RPC is a POST; Kubo rejects GET on `/api/v0`. Errors come back as
//! HTTP 500 with a JSON body of the form `{"Message": "...", "Code": 0}`.

use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{BackendError, BackendReceipt, ContentBackend, ObjectStats};

/// Configuration for the IPFS client.
#[derive(Clone, Debug)]
pub struct IpfsConfig {
    /// Base URL of the Kubo RPC API, e.g. `"http://127.0.0.1:5001"`.
    pub api_url: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5001".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// HTTP client for a Kubo node.
///
/// This client is cheap to clone-share behind an `Arc` and safe to use
/// from many tasks at once.
pub struct IpfsBackend {
    api_url: String,
    client: Client,
}

impl IpfsBackend {
    /// Constructs a client pointing at `cfg.api_url` (without a trailing
    /// slash, though one is tolerated).
    pub fn new(cfg: &IpfsConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_url: cfg.api_url.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        // Avoid accidental double slashes.
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn rpc(&self, path: &str, arg: &str) -> Result<reqwest::Response, BackendError> {
        let url = self.endpoint(path);
        let resp = self
            .client
            .post(&url)
            .query(&[("arg", arg)])
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(format!("HTTP POST {url} failed: {e}")))?;
        check_status(resp, arg).await
    }

    /// Pins `address` so the node keeps it through garbage collection.
    /// Uploads are already pinned on add.
    pub async fn pin(&self, address: &str) -> Result<Vec<String>, BackendError> {
        self.pin_rpc("/api/v0/pin/add", address).await
    }

    /// Removes the pin on `address`; the node may then collect it.
    pub async fn unpin(&self, address: &str) -> Result<Vec<String>, BackendError> {
        self.pin_rpc("/api/v0/pin/rm", address).await
    }

    async fn pin_rpc(&self, path: &str, address: &str) -> Result<Vec<String>, BackendError> {
        let resp = self.rpc(path, address).await?;
        let body = resp
            .json::<PinResponse>()
            .await
            .map_err(|e| BackendError::Protocol(format!("failed to parse {path} response: {e}")))?;
        tracing::debug!(%address, path, "pin state changed");
        Ok(body.pins)
    }
}

/// Response of `/api/v0/add`. Kubo encodes `Size` as a decimal string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
    size: String,
}

/// Response of `/api/v0/files/stat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatResponse {
    hash: String,
    size: u64,
    cumulative_size: u64,
    blocks: u64,
    #[serde(rename = "Type")]
    kind: String,
}

/// Response of `/api/v0/pin/add` and `/api/v0/pin/rm`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinResponse {
    #[serde(default)]
    pins: Vec<String>,
}

/// Error body returned by Kubo alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KuboError {
    message: String,
}

async fn check_status(resp: reqwest::Response, arg: &str) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<KuboError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    if is_missing_object(&message) {
        return Err(BackendError::NotFound(arg.to_string()));
    }
    Err(BackendError::Unavailable(format!(
        "IPFS node returned HTTP status {status}: {message}"
    )))
}

fn is_missing_object(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    m.contains("not found") || m.contains("invalid cid") || m.contains("invalid path")
}

impl ContentBackend for IpfsBackend {
    async fn add(&self, data: Vec<u8>) -> Result<BackendReceipt, BackendError> {
        let url = self.endpoint("/api/v0/add");
        let stored_len = data.len() as u64;
        let form = Form::new().part("file", Part::bytes(data).file_name("blob"));

        let resp = self
            .client
            .post(&url)
            .query(&[("pin", "true")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(format!("HTTP POST {url} failed: {e}")))?;
        let resp = check_status(resp, "add").await?;

        let body = resp
            .json::<AddResponse>()
            .await
            .map_err(|e| BackendError::Protocol(format!("failed to parse add response: {e}")))?;

        Ok(BackendReceipt {
            size: body.size.parse().unwrap_or(stored_len),
            address: body.hash,
        })
    }

    async fn cat(&self, address: &str) -> Result<Vec<u8>, BackendError> {
        let resp = self.rpc("/api/v0/cat", address).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BackendError::Unavailable(format!("failed to read cat body: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn stat(&self, address: &str) -> Result<ObjectStats, BackendError> {
        let resp = self
            .rpc("/api/v0/files/stat", &format!("/ipfs/{address}"))
            .await
            .map_err(|e| match e {
                BackendError::NotFound(_) => BackendError::NotFound(address.to_string()),
                other => other,
            })?;

        let body = resp
            .json::<StatResponse>()
            .await
            .map_err(|e| BackendError::Protocol(format!("failed to parse stat response: {e}")))?;

        Ok(ObjectStats {
            cid: body.hash,
            size: body.size,
            cumulative_size: body.cumulative_size,
            blocks: body.blocks,
            kind: body.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Query, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::types::ContentHash;

    type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    /// Just enough of the Kubo RPC surface to exercise the client.
    async fn spawn_fake_kubo() -> String {
        async fn add(State(objects): State<Objects>, mut form: Multipart) -> Json<Value> {
            let mut data = Vec::new();
            while let Some(field) = form.next_field().await.expect("multipart field") {
                if field.name() == Some("file") {
                    data = field.bytes().await.expect("field bytes").to_vec();
                }
            }
            let cid = format!("bafk{}", &ContentHash::of(&data).as_str()[..16]);
            let size = data.len().to_string();
            objects.lock().unwrap().insert(cid.clone(), data);
            Json(json!({ "Name": "blob", "Hash": cid, "Size": size }))
        }

        async fn cat(
            State(objects): State<Objects>,
            Query(q): Query<HashMap<String, String>>,
        ) -> Result<Vec<u8>, (StatusCode, Json<Value>)> {
            let arg = q.get("arg").cloned().unwrap_or_default();
            objects.lock().unwrap().get(&arg).cloned().ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "Message": "block was not found locally (offline)", "Code": 0 })),
            ))
        }

        async fn stat(
            State(objects): State<Objects>,
            Query(q): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, StatusCode> {
            let arg = q.get("arg").cloned().unwrap_or_default();
            let cid = arg.trim_start_matches("/ipfs/").to_string();
            let size = objects
                .lock()
                .unwrap()
                .get(&cid)
                .map(|d| d.len())
                .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
            Ok(Json(json!({
                "Hash": cid, "Size": size, "CumulativeSize": size + 11,
                "Blocks": 0, "Type": "file"
            })))
        }

        async fn pin(
            State(objects): State<Objects>,
            Query(q): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
            let arg = q.get("arg").cloned().unwrap_or_default();
            if !objects.lock().unwrap().contains_key(&arg) {
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "Message": "invalid path: invalid cid", "Code": 0 })),
                ));
            }
            Ok(Json(json!({ "Pins": [arg] })))
        }

        let app = Router::new()
            .route("/api/v0/add", post(add))
            .route("/api/v0/cat", post(cat))
            .route("/api/v0/files/stat", post(stat))
            .route("/api/v0/pin/add", post(pin))
            .route("/api/v0/pin/rm", post(pin))
            .with_state(Objects::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake kubo");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn client(api_url: String) -> IpfsBackend {
        IpfsBackend::new(&IpfsConfig {
            api_url,
            timeout: Duration::from_secs(5),
        })
        .expect("build client")
    }

    #[test]
    fn endpoint_avoids_double_slashes() {
        let c = client("http://127.0.0.1:5001/".to_string());
        assert_eq!(c.endpoint("/api/v0/cat"), "http://127.0.0.1:5001/api/v0/cat");
        assert_eq!(c.endpoint("api/v0/cat"), "http://127.0.0.1:5001/api/v0/cat");
    }

    #[test]
    fn add_response_can_be_deserialized() {
        let json = r#"{"Name":"blob","Hash":"QmTest","Size":"58"}"#;
        let resp: AddResponse = serde_json::from_str(json).expect("AddResponse should parse");
        assert_eq!(resp.hash, "QmTest");
        assert_eq!(resp.size, "58");
    }

    #[test]
    fn missing_object_messages_are_recognised() {
        assert!(is_missing_object("block was not found locally (offline)"));
        assert!(is_missing_object("invalid path \"/ipfs/zzz\": invalid cid"));
        assert!(!is_missing_object("context deadline exceeded"));
    }

    #[tokio::test]
    async fn add_cat_and_stat_against_fake_node() {
        let backend = client(spawn_fake_kubo().await);

        let receipt = backend.add(b"0123456789".to_vec()).await.expect("add");
        assert!(receipt.address.starts_with("bafk"));
        assert_eq!(receipt.size, 10);

        let data = backend.cat(&receipt.address).await.expect("cat");
        assert_eq!(data, b"0123456789");

        let stats = backend.stat(&receipt.address).await.expect("stat");
        assert_eq!(stats.cid, receipt.address);
        assert_eq!(stats.size, 10);
        assert_eq!(stats.cumulative_size, 21);
    }

    #[tokio::test]
    async fn pin_and_unpin_report_the_cid() {
        let backend = client(spawn_fake_kubo().await);
        let receipt = backend.add(b"pinned".to_vec()).await.expect("add");

        assert_eq!(backend.pin(&receipt.address).await.expect("pin"), [receipt.address.clone()]);
        assert_eq!(backend.unpin(&receipt.address).await.expect("unpin"), [receipt.address.clone()]);

        let err = backend.pin("bafkdoesnotexist").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unknown_cid_maps_to_not_found() {
        let backend = client(spawn_fake_kubo().await);
        let err = backend.cat("bafkdoesnotexist").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_node_is_unavailable() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let backend = client(format!("http://{addr}"));
        let err = backend.add(b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)), "got {err:?}");
    }
}
