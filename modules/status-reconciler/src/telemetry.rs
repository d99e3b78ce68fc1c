use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Crates whose `info` events are on by default, on top of whatever `RUST_LOG` asks for.
pub const LOG_TARGETS: &[&str] = &[
    "status_reconciler",
    "reconciler",
    "athena_client",
    "sheets_client",
];

pub fn log_filter(base: EnvFilter) -> Result<EnvFilter> {
    LOG_TARGETS.iter().try_fold(base, |filter, target| {
        Ok(filter.add_directive(format!("{target}=info").parse()?))
    })
}
