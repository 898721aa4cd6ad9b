//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scanforge",
    about = "Plugin-driven security tool orchestration",
    version
)]
pub struct Cli {
    /// Directory scanned for plugin manifests
    #[arg(long)]
    pub plugin_dir: Option<PathBuf>,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List registered plugins
    List {
        /// Restrict the listing to one category
        #[arg(long)]
        category: Option<String>,
    },

    /// Run plugins against a target
    Run {
        /// Primary target (host, URL or IP range)
        #[arg(long)]
        target: String,

        /// Plugin ids to run, comma separated
        #[arg(long, value_delimiter = ',')]
        plugins: Vec<String>,

        #[arg(long, default_value_t = 1)]
        workspace: i64,

        #[arg(long = "target-id", default_value_t = 1)]
        target_id: i64,

        /// Worker pool capacity for this job
        #[arg(long, default_value_t = 8)]
        workers: usize,

        /// Proxy address forwarded to plugins
        #[arg(long)]
        proxy: Option<String>,

        /// Per-tool timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_command() {
        let cli = Cli::try_parse_from(["scanforge", "list", "--category", "recon"]).unwrap();
        match cli.command {
            CliCommand::List { category } => assert_eq!(category.as_deref(), Some("recon")),
            other => panic!("Expected list command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_command_with_plugin_list() {
        let cli = Cli::try_parse_from([
            "scanforge",
            "run",
            "--target",
            "example.com",
            "--plugins",
            "recon.subfinder,scan.nuclei",
            "--workers",
            "4",
        ])
        .unwrap();

        match cli.command {
            CliCommand::Run {
                target,
                plugins,
                workers,
                workspace,
                ..
            } => {
                assert_eq!(target, "example.com");
                assert_eq!(plugins, vec!["recon.subfinder", "scan.nuclei"]);
                assert_eq!(workers, 4);
                assert_eq!(workspace, 1);
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_target() {
        assert!(Cli::try_parse_from(["scanforge", "run"]).is_err());
    }
}
