//! JSON-Lines control protocol over stdio
//!
//! ```text
//! ┌─────────────────┐    stdin (JSON-Lines)    ┌─────────────────┐
//! │   Controller    │ ───────────────────────► │   evalrig ipc   │
//! │  (UI, scripts)  │ ◄─────────────────────── │   (runner)      │
//! └─────────────────┘    stdout (JSON-Lines)   └─────────────────┘
//! ```
//!
//! ## Requests
//!
//! - `ping`, `status`, `shutdown`
//! - `start` (`pool_file`, `algorithms`, `extra`), `pause`, `resume`, `stop`,
//!   `force_stop`
//! - `subscribe` (optional `listener_id`), `drain` (`listener_id`),
//!   `unsubscribe` (`listener_id`)
//! - `report` (`format`: table, markdown or json)
//!
//! ## Responses
//!
//! `ready`, `pong`, `ack`, `status`, `subscribed`, `events`, `report`,
//! `error` (with the evaluator's error code), `shutdown_ack`.

pub mod protocol;
pub mod server;

pub use server::run_ipc_server;
