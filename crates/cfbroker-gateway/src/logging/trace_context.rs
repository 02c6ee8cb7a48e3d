//! Trace ids and per-request spans

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, info_span, Span};

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Short trace id: 6 hex chars mixed from a counter and the clock
pub fn generate_trace_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    format!("{:06x}", counter.wrapping_add(micros) & 0xFF_FFFF)
}

/// Correlation data for one broker request
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
    pub method: String,
    pub path: String,
    /// Broker instance id, when the path addresses one
    pub instance_id: Option<String>,
    /// Broker binding id, when the path addresses one
    pub binding_id: Option<String>,
    pub started_at: Instant,
}

impl TraceContext {
    pub fn new(method: &str, path: &str) -> Self {
        let (instance_id, binding_id) = osb_ids(path);
        Self {
            trace_id: generate_trace_id(),
            method: method.to_string(),
            path: path.to_string(),
            instance_id,
            binding_id,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Route label for logs, e.g. `instance=db-1 binding=b-7`
    pub fn target(&self) -> String {
        match (&self.instance_id, &self.binding_id) {
            (Some(i), Some(b)) => format!("instance={} binding={}", i, b),
            (Some(i), None) => format!("instance={}", i),
            _ => String::new(),
        }
    }
}

/// Pull instance and binding ids out of `/v2/service_instances/{id}/service_bindings/{id}`
fn osb_ids(path: &str) -> (Option<String>, Option<String>) {
    let mut segments = path.trim_matches('/').split('/');
    if segments.next() != Some("v2") || segments.next() != Some("service_instances") {
        return (None, None);
    }

    let instance = segments.next().filter(|s| !s.is_empty()).map(String::from);
    let binding = match segments.next() {
        Some("service_bindings") => segments.next().filter(|s| !s.is_empty()).map(String::from),
        _ => None,
    };
    (instance, binding)
}

pub struct RequestSpan;

impl RequestSpan {
    /// Span carrying the trace id for every log emitted while handling the request
    pub fn enter(ctx: &TraceContext) -> Span {
        info_span!(
            "request",
            trace_id = %ctx.trace_id,
            method = %ctx.method,
            path = %ctx.path,
        )
    }

    pub fn log_entry(ctx: &TraceContext) {
        let target = ctx.target();
        if target.is_empty() {
            info!(trace_id = %ctx.trace_id, "→ {} {}", ctx.method, ctx.path);
        } else {
            info!(
                trace_id = %ctx.trace_id,
                "→ {} {} {}",
                ctx.method,
                ctx.path,
                target
            );
        }
    }

    pub fn log_exit(ctx: &TraceContext, status: u16, detail: Option<&str>) {
        let elapsed = ctx.elapsed_ms();
        match detail {
            Some(d) => info!(trace_id = %ctx.trace_id, "← {} {} ({}ms)", status, d, elapsed),
            None => info!(trace_id = %ctx.trace_id, "← {} ({}ms)", status, elapsed),
        }
    }
}
