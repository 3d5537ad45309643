//! Logger setup for programs driving evaluations.

/// Initialize `env_logger`, honoring `RUST_LOG` and falling back to `default_level`.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init(default_level: &str) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", default_level),
    )
    .try_init();
}

/// Initialize logging from the `[evaluation] log_level` setting.
pub fn init_from_config(config: &crate::Config) {
    init(&config.evaluation.log_level);
}
