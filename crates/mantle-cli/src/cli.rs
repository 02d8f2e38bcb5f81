//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Mantle - Assemble deployment manifests and bootstrap director sessions
#[derive(Parser, Debug)]
#[command(name = "mantle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment root holding fragments, variables and state
    #[arg(long, global = true, env = "MANTLE_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Environment config file (defaults to <root>/mantle.toml)
    #[arg(long, global = true, env = "MANTLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Director admin username; empty keeps the caller's own client session
    #[arg(long, global = true, env = "MANTLE_ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not write the durable log file
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Render a fragment set into a manifest
    ///
    /// Prints the manifest when no output file is given. Exits with 10 when
    /// the fragment set is empty.
    Interpolate {
        /// Fragment set to render
        #[arg(long, value_enum, default_value_t = FragmentSet::Operations)]
        set: FragmentSet,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render the operations manifest and create or update the environment
    Deploy {
        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render the operations manifest and delete the environment
    Destroy {
        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render and upload the cloud config
    CloudConfig {
        /// Ad hoc variables document with the highest precedence
        #[arg(short = 'l', long = "vars")]
        vars: Option<PathBuf>,
    },

    /// Render and upload the runtime config
    RuntimeConfig {
        /// Runtime config name (the director's default when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Ad hoc variables document with the highest precedence
        #[arg(short = 'l', long = "vars")]
        vars: Option<PathBuf>,
    },

    /// Show the director the session points at
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved session as shell assignments
    Session {
        /// Show the client secret instead of redacting it
        #[arg(long)]
        reveal: bool,
    },

    /// Log in to the credential store
    Login,
}

/// Options shared by commands that render a manifest.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    /// Write the manifest here instead of a temporary file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ad hoc variables document with the highest precedence
    #[arg(short = 'l', long = "vars")]
    pub vars: Option<PathBuf>,
}

/// Fragment directories that can be rendered.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSet {
    Operations,
    CloudConfig,
    RuntimeConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interpolate_defaults() {
        let cli = Cli::try_parse_from(["mantle", "interpolate"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Interpolate {
                set: FragmentSet::Operations,
                render: RenderArgs {
                    output: None,
                    vars: None,
                },
            }
        );
    }

    #[test]
    fn parse_interpolate_set_and_files() {
        let cli = Cli::try_parse_from([
            "mantle",
            "interpolate",
            "--set",
            "runtime-config",
            "-o",
            "out.yml",
            "-l",
            "adhoc.yml",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Interpolate {
                set: FragmentSet::RuntimeConfig,
                render: RenderArgs {
                    output: Some(PathBuf::from("out.yml")),
                    vars: Some(PathBuf::from("adhoc.yml")),
                },
            }
        );
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mantle",
            "session",
            "--root",
            "/envs/lab",
            "--admin-username",
            "",
            "--reveal",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/envs/lab"));
        assert_eq!(cli.admin_username.as_deref(), Some(""));
        assert_eq!(cli.command, Commands::Session { reveal: true });
    }

    #[test]
    fn parse_runtime_config_name() {
        let cli = Cli::try_parse_from(["mantle", "runtime-config", "--name", "dns"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::RuntimeConfig {
                name: Some("dns".to_string()),
                vars: None,
            }
        );
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["mantle"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
