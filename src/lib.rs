pub mod decode;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod rank;
pub mod server;
pub mod settings;
pub mod storage;
pub mod torch;

/// Fixed detect-api constants. Everything tunable per deployment lives in
/// `settings::Settings` instead
pub mod config {
    /// Boxes scoring below this are dropped by the detector itself
    pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

    /// Maximum number of detections returned to the client
    pub const TOP_N: usize = 10;

    /// Default config file, read if present
    pub const CONFIG_FILE: &str = "detect.toml";

    /// Prefix for environment overrides, e.g. `DETECT_MODEL_PATH`
    pub const ENV_PREFIX: &str = "DETECT";
}

/// Startup helpers
pub mod util {
    use tracing_subscriber::EnvFilter;

    /// Install the global tracing subscriber. `RUST_LOG` wins over the
    /// configured filter
    pub fn init_tracing(default_filter: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
