use anyhow::Result;

/// Initialize the logging system with env_logger.
///
/// The `verbose` flag controls whether debug logs are shown; `RUST_LOG`
/// overrides either default.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "beatcore=debug,warn"
    } else {
        "beatcore=info,warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init()?;
    Ok(())
}
