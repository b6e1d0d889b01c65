use tracing_subscriber::{EnvFilter, fmt};

/// Install a stderr subscriber filtered by `RUST_LOG`, defaulting to warnings.
pub fn init_logging() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("attrtree=warn"));
	// A second install in the same process is ignored.
	let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).try_init();
}
