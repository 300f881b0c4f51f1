//! Command-line flags layered over the loaded configuration

use std::path::PathBuf;

use clap::Parser;
use levelset_domain::{Config, LogFormat};

/// Level-triggered reconciliation controller
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "levelset", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON); skips environment and path probing
    #[arg(short, long, env = "LEVELSET_CONFIG")]
    pub config: Option<PathBuf>,

    /// API server base URL
    #[arg(long)]
    pub server: Option<String>,

    /// Namespace to watch; pass an empty string for all namespaces
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Number of reconcile workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Seconds between full relists
    #[arg(long)]
    pub resync_secs: Option<u64>,

    /// Log output format: pretty or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Override `config` with every flag that was given
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.client.server_url.clone_from(server);
        }
        if let Some(namespace) = &self.namespace {
            config.informer.namespace.clone_from(namespace);
        }
        if let Some(workers) = self.workers {
            config.controller.workers = workers;
        }
        if let Some(secs) = self.resync_secs {
            config.informer.resync_interval_secs = secs;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "levelset",
            "--namespace",
            "kube-system",
            "--workers",
            "4",
            "--resync-secs",
            "90",
            "--log-format",
            "json",
        ])
        .unwrap();
        let mut config = Config::default();

        cli.apply(&mut config);

        assert_eq!(config.informer.namespace, "kube-system");
        assert_eq!(config.controller.workers, 4);
        assert_eq!(config.informer.resync_interval_secs, 90);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_no_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["levelset"]).unwrap();
        let mut config = Config::default();

        cli.apply(&mut config);

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_namespace_is_accepted() {
        let cli = Cli::try_parse_from(["levelset", "--namespace", ""]).unwrap();
        let mut config = Config::default();

        cli.apply(&mut config);

        assert!(config.informer.namespace.is_empty());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        assert!(Cli::try_parse_from(["levelset", "--log-format", "xml"]).is_err());
    }
}
