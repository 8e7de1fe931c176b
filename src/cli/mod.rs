//! CLI commands and interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tetdeck::contact::MembershipPolicy;

#[derive(Parser, Debug)]
#[command(name = "tetdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Only report errors and hide the progress bar
    #[arg(short, long, global = true, conflicts_with_all = ["verbose", "debug"])]
    pub quiet: bool,
}

impl Cli {
    /// Whether the progress bar should stay hidden
    ///
    /// Debug output would interleave with the bar, so it is hidden then too.
    pub fn hide_progress(&self) -> bool {
        self.quiet || self.debug
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tetrahedralize a scene and write the solver input deck
    Build {
        /// Scene file (JSON)
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        /// Output deck path (.inp)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Configuration file (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Face membership policy: vertex-set or triangle-containment
        #[arg(long)]
        policy: Option<MembershipPolicy>,

        /// Object processing order (format: "A,B,C")
        #[arg(long, value_delimiter = ',')]
        order: Option<Vec<String>>,

        /// Tetrahedralizer executable
        #[arg(long, value_name = "PATH")]
        tetgen: Option<PathBuf>,

        /// Tetrahedralizer timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Keep surfaces and tables in this directory
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        /// Also write the mesh as a VTU file
        #[arg(long, value_name = "FILE")]
        vtu: Option<PathBuf>,

        /// Also write a JSON run report
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Display node, element and surface counts of a deck
    Info {
        /// Path to the deck
        #[arg(value_name = "FILE")]
        deck: PathBuf,
    },

    /// Write the default configuration
    InitConfig {
        /// Output configuration path
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_hides_progress() {
        let cli = Cli::try_parse_from(["tetdeck", "-q", "info", "model.inp"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.hide_progress());

        let cli = Cli::try_parse_from(["tetdeck", "info", "model.inp"]).unwrap();
        assert!(!cli.hide_progress());

        let cli = Cli::try_parse_from(["tetdeck", "-d", "info", "model.inp"]).unwrap();
        assert!(cli.hide_progress());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["tetdeck", "-q", "-v", "info", "model.inp"]).is_err());
    }
}
