//! Request correlation for the broker HTTP surface
//!
//! Every request gets a short trace id, a `request` span, and one entry and
//! one exit log line.

mod trace_context;

pub use trace_context::{generate_trace_id, RequestSpan, TraceContext};
