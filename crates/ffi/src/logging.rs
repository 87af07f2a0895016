use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs a stderr log subscriber. Later calls are ignored.
///
/// `RUST_LOG` overrides the level chosen by `verbosity`.
#[unsafe(no_mangle)]
pub extern "C" fn wv_init_logging(verbosity: u32) {
	// 0 = errors only
	// 1 = info, debug for the bridge crates
	// 2+ = debug for everything
	let filter = match verbosity {
		0 => "error",
		1 => "info,wv=debug,wv_runtime=debug,wv_ffi=debug",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	let installed = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.try_init();
	if installed.is_err() {
		tracing::debug!("log subscriber already installed");
	}
}
