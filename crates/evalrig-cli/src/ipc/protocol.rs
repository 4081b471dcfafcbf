//! IPC protocol definitions
//!
//! Uses JSON-Lines: one request object per stdin line, one response object
//! per stdout line.

use std::path::PathBuf;

use evalrig_core::events::RemoteListenerStatus;
use evalrig_core::{EvalError, EvaluationEvent, RunnerState};
use serde::{Deserialize, Serialize};

use crate::algorithms::AlgorithmSpec;

/// Request from a controlling process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl IpcRequest {
    #[cfg(test)]
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parse params into a typed parameter struct; a missing params object
    /// is read as `{}`
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.params {
            serde_json::Value::Null => serde_json::from_value(serde_json::json!({})),
            params => serde_json::from_value(params.clone()),
        }
    }
}

/// Parameters of `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartParams {
    pub pool_file: PathBuf,
    pub algorithms: Vec<AlgorithmSpec>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Parameters of `subscribe`, `drain` and `unsubscribe`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenerParams {
    #[serde(default)]
    pub listener_id: Option<String>,
}

/// Parameters of `report`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub format: Option<String>,
}

/// Response from the evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Server is ready for requests
    Ready { version: String },

    Pong,

    /// Request accepted
    Ack { method: String },

    Status {
        state: RunnerState,
        deferred_teardowns: usize,
        listeners: Vec<RemoteListenerStatus>,
    },

    Subscribed { listener_id: String },

    /// Events queued for a remote listener since its last drain
    Events {
        listener_id: String,
        events: Vec<EvaluationEvent>,
    },

    Report { format: String, content: String },

    Error { code: String, message: String },

    ShutdownAck,
}

impl IpcResponse {
    pub fn ack(method: &str) -> Self {
        IpcResponse::Ack {
            method: method.to_string(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        IpcResponse::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error response carrying the evaluator's error code when there is one
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<EvalError>() {
            Some(eval) => Self::error(eval.code(), eval.to_string()),
            None => Self::error("error", format!("{:#}", err)),
        }
    }

    pub fn to_json_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("{}\n", json),
            Err(e) => format!(
                "{{\"type\":\"error\",\"code\":\"json_error\",\"message\":{:?}}}\n",
                e.to_string()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parsing() {
        let request = IpcRequest::from_json_line(
            r#"{"method":"start","params":{"pool_file":"pool.json","algorithms":["global_mean"]}}"#,
        )
        .unwrap();
        assert_eq!(request.method(), "start");

        let params: StartParams = request.params().unwrap();
        assert_eq!(params.pool_file, PathBuf::from("pool.json"));
        assert_eq!(params.algorithms.len(), 1);
        assert!(params.extra.is_null());
    }

    #[test]
    fn test_missing_params_read_as_empty() {
        let request = IpcRequest::from_json_line(r#"{"method":"subscribe"}"#).unwrap();
        let params: ListenerParams = request.params().unwrap();
        assert!(params.listener_id.is_none());

        let start: Result<StartParams, _> = request.params();
        assert!(start.is_err());
    }

    #[test]
    fn test_response_tags() {
        let line = IpcResponse::ack("pause").to_json_line();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value, json!({ "type": "ack", "method": "pause" }));

        let value = serde_json::to_value(IpcResponse::ShutdownAck).unwrap();
        assert_eq!(value, json!({ "type": "shutdown_ack" }));

        let value = serde_json::to_value(IpcResponse::Status {
            state: RunnerState::Paused,
            deferred_teardowns: 0,
            listeners: Vec::new(),
        })
        .unwrap();
        assert_eq!(value["state"], "paused");
    }

    #[test]
    fn test_error_codes() {
        let err = anyhow::Error::new(EvalError::AlreadyRunning);
        match IpcResponse::from_error(&err) {
            IpcResponse::Error { code, .. } => assert_eq!(code, "already_running"),
            other => panic!("unexpected response: {:?}", other),
        }

        let err = anyhow::anyhow!("disk on fire");
        match IpcResponse::from_error(&err) {
            IpcResponse::Error { code, message } => {
                assert_eq!(code, "error");
                assert_eq!(message, "disk on fire");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
