//! gust — apply a prompt template to every row of a delimited table via
//! parallel, rate-limited completion calls.
//!
//! The core is [`scheduler::annotate`]: it stages one task per row with a
//! staggered start offset, bounds in-flight completions with a worker
//! pool, retries transient failures inside the [`client`], and writes
//! results back in the input row order with per-run [`metrics`].

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod table;
pub mod template;
