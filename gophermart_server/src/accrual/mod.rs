//! The accrual pipeline: a tick-driven dispatcher that claims unprocessed
//! orders from the ledger, a bounded fan-out channel, and a pool of workers
//! that query the external accrual service and settle the results.

mod client;
mod poller;
mod rate_gate;

pub use client::{AccrualClient, AccrualReply, AccrualSource, AccrualStatus, FetchOutcome};
pub use poller::start_accrual_pipeline;
pub use rate_gate::RateGate;
