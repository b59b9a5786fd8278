//! Process-wide logging setup shared by the binaries.

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use tracing::LogFormat;

/// Initialize process-wide logging (JSON unless `LOG_FORMAT=pretty`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
