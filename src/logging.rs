use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// The filter directive for a configured level and a number of `-v` flags.
pub fn filter_directive(level: &str, verbose: u8) -> String {
    match verbose {
        0 => level.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Send log events to stderr, keeping stdout for drafts.
pub fn init_logging(level: &str, verbose: u8) -> Result<()> {
    let directive = filter_directive(level, verbose);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log level '{}'.", directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_level() {
        assert_eq!(filter_directive("warn", 0), "warn");
        assert_eq!(filter_directive("taskdraft=debug", 0), "taskdraft=debug");
        assert_eq!(filter_directive("warn", 1), "info");
        assert_eq!(filter_directive("warn", 5), "trace");
    }
}
