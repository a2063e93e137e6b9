//! RPC transports.
//!
//! The chain layer talks to the node through the narrow
//! `call(request) → response` capability; whether that rides HTTP or a
//! local stream socket is decided once, at wiring time.

use crate::jsonrpc::{RpcRequest, RpcResponse};
use async_trait::async_trait;
use shared_types::ChainError;
use std::collections::HashMap;

#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, request: RpcRequest) -> Result<RpcResponse, ChainError>;
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    url: String,
    headers: Vec<(String, String)>,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            url: url.into(),
            headers: headers.into_iter().collect(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, request: RpcRequest) -> Result<RpcResponse, ChainError> {
        let mut builder = self.http.post(&self.url).json(&request);
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Transport(format!(
                "invalid server response: {status}"
            )));
        }
        response
            .json::<RpcResponse>()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }
}

/// JSON-RPC over a local Unix stream socket.
///
/// Frames are bare JSON documents with no delimiter, bidirectional on a
/// single connection; the mutex serializes callers so request/response
/// pairs cannot interleave. A failed exchange drops the connection and the
/// next call redials.
#[cfg(unix)]
pub struct IpcTransport {
    path: std::path::PathBuf,
    conn: tokio::sync::Mutex<Option<tokio::net::UnixStream>>,
}

#[cfg(unix)]
impl IpcTransport {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: tokio::sync::Mutex::new(None),
        }
    }

    async fn exchange(
        stream: &mut tokio::net::UnixStream,
        request: &RpcRequest,
    ) -> Result<RpcResponse, ChainError> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let payload =
            serde_json::to_vec(request).map_err(|e| ChainError::Transport(e.to_string()))?;
        stream
            .write_all(&payload)
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let mut buf = Vec::with_capacity(4096);
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| ChainError::Transport(e.to_string()))?;
            if n == 0 {
                return Err(ChainError::Transport("socket closed mid-response".into()));
            }
            buf.extend_from_slice(&chunk[..n]);
            match serde_json::from_slice::<RpcResponse>(&buf) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_eof() => continue,
                Err(e) => return Err(ChainError::InvalidResponse(e.to_string())),
            }
        }
    }
}

#[cfg(unix)]
#[async_trait]
impl RpcTransport for IpcTransport {
    async fn call(&self, request: RpcRequest) -> Result<RpcResponse, ChainError> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            let stream = tokio::net::UnixStream::connect(&self.path)
                .await
                .map_err(|e| ChainError::Transport(e.to_string()))?;
            *guard = Some(stream);
        }
        let Some(stream) = guard.as_mut() else {
            return Err(ChainError::Transport("socket unavailable".into()));
        };
        match Self::exchange(stream, &request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                // Drop the broken connection; the next call redials.
                *guard = None;
                Err(e)
            }
        }
    }
}
