use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use wayfarer_config::Environment;

/// Default configuration file, used when present
pub const DEFAULT_CONFIG: &str = "wayfarer.toml";

/// Wayfarer travel backend
#[derive(Debug, Parser)]
#[command(name = "wayfarer", about = "Travel companion backend: trip drafts, cache and pub/sub")]
pub struct Args {
    /// Path to configuration file (defaults to ./wayfarer.toml when it exists)
    #[arg(short, long, env = "WAYFARER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "WAYFARER_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the runtime environment (development, production, test)
    #[arg(long, env = "WAYFARER_ENV")]
    pub environment: Option<Environment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "wayfarer",
            "--config",
            "/etc/wayfarer.toml",
            "--listen",
            "127.0.0.1:4000",
            "--environment",
            "development",
        ])
        .unwrap();

        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("/etc/wayfarer.toml")));
        assert_eq!(args.listen, Some(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(args.environment, Some(Environment::Development));
    }

    #[test]
    fn rejects_unknown_environment() {
        assert!(Args::try_parse_from(["wayfarer", "--environment", "staging"]).is_err());
    }
}
