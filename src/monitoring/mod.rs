/*!
 * Monitoring Module
 * Structured tracing setup for scheduler drivers
 */

pub mod tracer;

pub use tracer::{init_tracing, span_replay};
