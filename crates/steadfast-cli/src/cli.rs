//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// steadfast - crash-safe, conflict-aware file writes
#[derive(Parser, Debug)]
#[command(name = "steadfast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "STEADFAST_CONFIG")]
    pub config: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print a file's content; a missing file prints nothing
    Read {
        /// Path or file:// URI
        path: String,
    },

    /// Replace a file with standard input, durably
    ///
    /// Prints the fingerprint of the written content, which can be passed
    /// to --expect on the next write.
    ///
    /// Examples:
    ///   echo hello | steadfast write notes.txt
    ///   steadfast write notes.txt --expect sha256:2cf2...  < new.txt
    Write {
        /// Path or file:// URI
        path: String,

        /// Refuse the write unless the current content has this fingerprint
        #[arg(long)]
        expect: Option<String>,
    },

    /// Remove a file and any leftovers of failed writes
    Rm {
        /// Path or file:// URI
        path: String,
    },

    /// Print the fingerprint of a file's current content
    Fingerprint {
        /// Path or file:// URI
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_with_expect() {
        let cli = Cli::try_parse_from(["steadfast", "write", "a.txt", "--expect", "sha256:00"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Write {
                path: "a.txt".into(),
                expect: Some("sha256:00".into()),
            }
        );
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["steadfast", "rm", "a.txt", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn config_env_matches_library() {
        use clap::CommandFactory;

        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert_eq!(
            config.get_env(),
            Some(std::ffi::OsStr::new(steadfast_fs::settings::CONFIG_ENV))
        );
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["steadfast"]).is_err());
    }
}
