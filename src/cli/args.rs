//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Slugsite clean-URL site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Source directory holding the authored pages (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Config file path (default: slugsite.toml)
    #[arg(short = 'C', long, default_value = "slugsite.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Emit renamed pages, scripts, assets and the redirect manifest
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Print the route table without writing anything
    #[command(visible_alias = "r")]
    Routes {
        /// Print entries and rules as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Build command arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(short, long)]
    pub clean: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_flags() {
        let cli = Cli::try_parse_from(["slugsite", "-o", "public", "build", "--clean", "-V"]).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("public")));
        assert_eq!(cli.config, PathBuf::from("slugsite.toml"));
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert!(build_args.clean);
        assert!(build_args.verbose);
    }

    #[test]
    fn test_routes_json() {
        let cli = Cli::try_parse_from(["slugsite", "-C", "site.toml", "routes", "--json"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(matches!(cli.command, Commands::Routes { json: true }));
    }

    #[test]
    fn test_alias() {
        let cli = Cli::try_parse_from(["slugsite", "b"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { .. }));
    }
}
