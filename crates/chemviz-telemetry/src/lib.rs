//! Logging setup for chemviz binaries.

pub mod diagnostic_layer;

pub use diagnostic_layer::{DiagnosticEvent, DiagnosticLayer};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CHEMVIZ_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Options for [`init`].
#[derive(Default)]
pub struct TelemetryOptions {
    /// Emit log lines as JSON instead of human-readable text.
    pub json: bool,
    /// Also forward warnings and errors to this layer.
    pub diagnostics: Option<DiagnosticLayer>,
}

/// Builds the filter from `CHEMVIZ_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber. Log lines go to stderr so command output
/// on stdout stays clean.
pub fn init(options: TelemetryOptions) -> Result<(), TryInitError> {
    let TelemetryOptions { json, diagnostics } = options;

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(json_layer)
        .with(text_layer)
        .with(diagnostics)
        .try_init()
}
