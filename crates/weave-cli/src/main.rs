//! Weave CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weave_config::MAX_INCLUDES;

mod commands;
mod tree;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Resolve CI configuration includes", long_about = None)]
struct Cli {
    /// Repository working tree that local includes resolve against
    #[arg(long, env = "WEAVE_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the includes of a pipeline configuration
    Resolve {
        /// Path to the configuration file, relative to the root
        #[arg(default_value = "weave.kdl")]
        path: String,
        /// Project the configuration belongs to
        #[arg(long, env = "WEAVE_PROJECT", default_value = "local")]
        project: String,
        /// Revision the working tree is checked out at
        #[arg(long, env = "WEAVE_REVISION", default_value = "HEAD")]
        revision: String,
        /// Pipeline variable, as NAME=VALUE (repeatable)
        #[arg(long = "var", value_parser = parse_variable)]
        variables: Vec<(String, String)>,
        /// Fetch local includes and resolve their includes too
        #[arg(short, long)]
        recursive: bool,
        /// Print resolved files as JSON
        #[arg(long)]
        json: bool,
        /// Print per-stage timings after resolving
        #[arg(long)]
        timings: bool,
        /// Maximum number of includes across the whole tree
        #[arg(long, default_value_t = MAX_INCLUDES)]
        max_includes: usize,
    },
    /// Validate the include directives of a pipeline configuration
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "weave.kdl")]
        path: String,
    },
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            path,
            project,
            revision,
            variables,
            recursive,
            json,
            timings,
            max_includes,
        } => {
            let options = commands::ResolveOptions {
                root: cli.root,
                path,
                project,
                revision,
                variables,
                recursive,
                json,
                timings,
                max_includes,
            };
            commands::resolve(&options)?;
        }
        Commands::Validate { path } => {
            commands::validate(&cli.root.join(path))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("ENV=prod").unwrap(),
            ("ENV".to_string(), "prod".to_string())
        );
        assert_eq!(
            parse_variable("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert!(parse_variable("ENV").is_err());
        assert!(parse_variable("=prod").is_err());
    }

    #[test]
    fn test_cli_parses_resolve_flags() {
        let cli = Cli::try_parse_from([
            "weave", "--root", "/repo", "resolve", "ci.kdl", "--var", "A=1", "--var", "B=2", "-r",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                path,
                variables,
                recursive,
                max_includes,
                ..
            } => {
                assert_eq!(path, "ci.kdl");
                assert_eq!(variables.len(), 2);
                assert!(recursive);
                assert_eq!(max_includes, MAX_INCLUDES);
            }
            Commands::Validate { .. } => panic!("expected resolve"),
        }
        assert_eq!(cli.root, PathBuf::from("/repo"));
    }
}
