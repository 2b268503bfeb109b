use clap::{Parser, Subcommand};

/// `Waypoint` - calibrated identity and call enforcement for task/collaboration APIs.
#[derive(Parser, Debug)]
#[command(name = "waypoint")]
#[command(version)]
#[command(
    about = "Discovers who each connector authenticates as and rewrites tool calls accordingly.",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe every configured connector and store a fresh snapshot
    Calibrate,

    /// Check that every connector still answers with its stored credentials
    Verify,

    /// Show the stored calibration snapshot and whether it needs refreshing
    Status,

    /// Show connector health
    Health {
        /// Run a health cycle now instead of reading the stored result
        #[arg(long)]
        now: bool,
    },

    /// Rewrite one tool call and print the result as JSON
    Enforce {
        /// Tool name, e.g. `asana.list_tasks`
        #[arg(long)]
        tool: String,

        /// Call parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Run calibration, verification and health monitoring until interrupted
    Monitor,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::CommandFactory;
    use clap::Parser;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_enforce_with_params() {
        let cli = Cli::parse_from([
            "waypoint",
            "enforce",
            "--tool",
            "linear.create_issue",
            "--params",
            r#"{"labels":["bug"]}"#,
        ]);

        match cli.command {
            Commands::Enforce { tool, params } => {
                assert_eq!(tool, "linear.create_issue");
                assert_eq!(params, r#"{"labels":["bug"]}"#);
            }
            other => panic!("expected enforce command, got {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["waypoint", "health", "--now", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Health { now: true }));
    }

    #[test]
    fn enforce_params_default_to_empty_object() {
        let cli = Cli::parse_from(["waypoint", "enforce", "--tool", "list_issues"]);
        let Commands::Enforce { params, .. } = cli.command else {
            panic!("expected enforce command");
        };
        assert_eq!(params, "{}");
    }
}
