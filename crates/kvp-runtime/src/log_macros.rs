//! Domain-tagged logging macros.
//!
//! Every event carries a `domain` field naming the area it belongs to:
//!
//! - `sys`  — supplier lifecycle (start, shutdown)
//! - `pipe` — the update pipeline (batches, source termination)
//! - `conf` — configuration loading
//! - `res`  — resource and counter reports
//!
//! ```ignore
//! kvp_info!(sys, max_batch_size = 64, "supplier started");
//! kvp_warn!(pipe, error = %e, "update source failed");
//! ```
//!
//! The domain is a bare identifier, not a string literal.

#[doc(hidden)]
macro_rules! kvp_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

macro_rules! kvp_error {
    ($domain:ident, $($rest:tt)*) => {
        kvp_log!(error, $domain, $($rest)*)
    };
}

macro_rules! kvp_warn {
    ($domain:ident, $($rest:tt)*) => {
        kvp_log!(warn, $domain, $($rest)*)
    };
}

macro_rules! kvp_info {
    ($domain:ident, $($rest:tt)*) => {
        kvp_log!(info, $domain, $($rest)*)
    };
}

macro_rules! kvp_debug {
    ($domain:ident, $($rest:tt)*) => {
        kvp_log!(debug, $domain, $($rest)*)
    };
}

/// Per-update tracing; compiled in but filtered out below `trace`.
macro_rules! kvp_trace {
    ($domain:ident, $($rest:tt)*) => {
        kvp_log!(trace, $domain, $($rest)*)
    };
}
