//! IPC server: requests from stdin, responses to stdout
//!
//! The server owns one [`EvaluationRunner`]. Remote observers subscribe to
//! its event hub and poll their queues with `drain`; the hub's liveness
//! sweep runs for as long as the server is alive.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use evalrig_core::{EvalConfig, EvalError, EvaluationRunner, ReportFormat, generate_report};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::protocol::{IpcRequest, IpcResponse, ListenerParams, ReportParams, StartParams};
use crate::algorithms::AlgorithmSpec;
use crate::pool::load_pool;

pub struct IpcServer {
    runner: Arc<EvaluationRunner>,
    response_tx: mpsc::UnboundedSender<IpcResponse>,
}

impl IpcServer {
    pub fn new(config: EvalConfig) -> Result<(Self, mpsc::UnboundedReceiver<IpcResponse>)> {
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let runner = EvaluationRunner::new(config)?;
        Ok((
            Self {
                runner: Arc::new(runner),
                response_tx,
            },
            response_rx,
        ))
    }

    pub fn runner(&self) -> &Arc<EvaluationRunner> {
        &self.runner
    }

    fn send(&self, response: IpcResponse) {
        let _ = self.response_tx.send(response);
    }

    /// Process one request; returns `true` when the server should shut down
    pub async fn process_request(&self, request: IpcRequest) -> bool {
        tracing::debug!(method = request.method(), "ipc request");
        let method = request.method().to_string();
        let outcome = match method.as_str() {
            "ping" => Ok(IpcResponse::Pong),
            "shutdown" => {
                self.send(IpcResponse::ShutdownAck);
                return true;
            }
            "start" => self.handle_start(&request),
            "pause" => self
                .runner
                .pause()
                .map(|_| IpcResponse::ack(&method))
                .map_err(Into::into),
            "resume" => self
                .runner
                .resume()
                .map(|_| IpcResponse::ack(&method))
                .map_err(Into::into),
            "stop" => self.blocking_stop().await.map(|_| IpcResponse::ack(&method)),
            "force_stop" => {
                if self.runner.force_stop() {
                    Ok(IpcResponse::ack(&method))
                } else {
                    Err(EvalError::NotRunning.into())
                }
            }
            "status" => Ok(self.status()),
            "subscribe" => self.handle_subscribe(&request),
            "drain" => self.handle_drain(&request),
            "unsubscribe" => self.handle_unsubscribe(&request),
            "report" => self.handle_report(&request),
            unknown => Ok(IpcResponse::error(
                "unknown_method",
                format!("Unknown method: {}", unknown),
            )),
        };

        match outcome {
            Ok(response) => self.send(response),
            Err(e) => {
                tracing::warn!(method = %method, error = %e, "ipc request failed");
                self.send(IpcResponse::from_error(&e));
            }
        }
        false
    }

    fn handle_start(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let params: StartParams = request
            .params()
            .map_err(|e| EvalError::invalid_input(format!("Invalid start parameters: {}", e)))?;
        let algorithms = params
            .algorithms
            .iter()
            .map(AlgorithmSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        let pool = load_pool(&params.pool_file)?;
        self.runner.evaluate(algorithms, pool, params.extra)?;
        Ok(IpcResponse::ack("start"))
    }

    async fn blocking_stop(&self) -> Result<()> {
        let runner = Arc::clone(&self.runner);
        tokio::task::spawn_blocking(move || runner.stop())
            .await
            .context("stop task failed")
    }

    fn status(&self) -> IpcResponse {
        let hub = self.runner.hub();
        IpcResponse::Status {
            state: self.runner.state(),
            deferred_teardowns: self.runner.deferred_teardowns(),
            listeners: hub
                .remote_ids()
                .iter()
                .filter_map(|id| hub.remote_status(id))
                .collect(),
        }
    }

    fn handle_subscribe(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let params: ListenerParams = request.params()?;
        let listener_id = self.runner.hub().register_remote(params.listener_id);
        Ok(IpcResponse::Subscribed { listener_id })
    }

    fn handle_drain(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let listener_id = required_listener_id(request)?;
        let events = self.runner.hub().drain_events(&listener_id)?;
        Ok(IpcResponse::Events {
            listener_id,
            events,
        })
    }

    fn handle_unsubscribe(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let listener_id = required_listener_id(request)?;
        if !self.runner.hub().unregister_remote(&listener_id) {
            return Err(EvalError::UnknownListener(listener_id).into());
        }
        Ok(IpcResponse::ack("unsubscribe"))
    }

    fn handle_report(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let params: ReportParams = request.params()?;
        let name = params.format.unwrap_or_else(|| "json".to_string());
        let format = ReportFormat::parse(&name).ok_or_else(|| {
            EvalError::invalid_field("format", format!("Unknown report format: {}", name))
        })?;
        let content = generate_report(&self.runner.result_registry(), format)?;
        Ok(IpcResponse::Report {
            format: name,
            content,
        })
    }

    /// Stop the run, tear down and close the hub
    pub async fn close(&self) {
        let runner = Arc::clone(&self.runner);
        if let Err(e) = tokio::task::spawn_blocking(move || runner.close()).await {
            tracing::error!(error = %e, "failed to close runner");
        }
    }
}

fn required_listener_id(request: &IpcRequest) -> Result<String> {
    let params: ListenerParams = request.params()?;
    params
        .listener_id
        .ok_or_else(|| EvalError::invalid_field("listener_id", "listener_id is required").into())
}

/// Writes responses to stdout until every sender is gone
async fn run_response_writer(mut response_rx: mpsc::UnboundedReceiver<IpcResponse>) {
    let stdout = io::stdout();

    while let Some(response) = response_rx.recv().await {
        let line = response.to_json_line();
        let mut handle = stdout.lock();
        if handle.write_all(line.as_bytes()).is_err() {
            break;
        }
        if handle.flush().is_err() {
            break;
        }
    }
}

/// Run the IPC server until `shutdown` or end of input
pub async fn run_ipc_server(config: EvalConfig) -> Result<()> {
    let (server, response_rx) = IpcServer::new(config)?;
    let writer_handle = tokio::spawn(run_response_writer(response_rx));

    let token = CancellationToken::new();
    let sweeper = server.runner().hub().spawn_sweeper(token.clone());

    server.send(IpcResponse::Ready {
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    loop {
        let line = tokio::task::spawn_blocking(|| {
            let stdin = io::stdin();
            let mut handle = stdin.lock();
            let mut buf = String::new();
            match handle.read_line(&mut buf) {
                Ok(0) => None,
                Ok(_) => Some(buf),
                Err(_) => None,
            }
        })
        .await
        .context("stdin reader failed")?;

        let Some(line) = line else {
            tracing::info!("ipc input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match IpcRequest::from_json_line(&line) {
            Ok(request) => {
                if server.process_request(request).await {
                    break;
                }
            }
            Err(e) => server.send(IpcResponse::error(
                "parse_error",
                format!("Failed to parse request: {}", e),
            )),
        }
    }

    token.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "listener sweeper ended abnormally");
    }
    server.close().await;
    drop(server);
    let _ = writer_handle.await;
    Ok(())
}
