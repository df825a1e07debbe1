//! ZPL Labels Print Client: send label batches to an HTTP print gateway.
//!
//! [`GatewayClient`] posts an assembled
//! [`BatchPrintRequest`](zpl_labels_core::BatchPrintRequest) with bounded
//! retry and cancellation; [`Orchestrator`] drives a whole print run
//! (validate, encode, dispatch, interpret) and publishes its status.
mod client;
mod config;
mod error;
mod orchestrator;
mod result;
mod retry;
mod status;

pub use client::{BatchDispatcher, GatewayClient};
pub use config::{
    DEFAULT_BATCH_PATH, DEFAULT_STATUS_PATH, GatewayConfig, GatewayTimeouts, OrchestratorConfig,
    RetryConfig,
};
pub use error::DispatchError;
pub use orchestrator::{
    Orchestrator, PreviewError, PreviewSink, PrintCounts, PrintPhase, PrintRejected, PrintReport,
    PrintStatus, StatusClass,
};
pub use result::{
    GatewayResponse, JobOutcome, LABEL_PRINTED, LabelOutcome, PrintJobResult, STATUS_COMPLETED,
};
pub use retry::retry_op;
pub use status::PrinterStatus;
