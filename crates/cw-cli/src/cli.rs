use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cw_gameval::GameValType;
use cw_types::IndexType;

#[derive(Parser)]
#[command(
    name = "cachewatch",
    about = "cachewatch: compare game cache versions and report what changed",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two cache versions and write pages for changed entities
    #[command(alias = "diffs")]
    Differences(DifferencesArgs),
    /// Compare two exported directory trees and write added/removed/differences
    TreeDiff(TreeDiffArgs),
    /// Report GameVal names whose id changed between two cache versions
    Gameval(GamevalArgs),
}

/// Options shared by commands that open caches by version.
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Old cache version (directory name under the caches root, or `latest`)
    #[arg(long)]
    pub old: String,
    /// New cache version
    #[arg(long)]
    pub new: String,
    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory holding one directory per cache version
    #[arg(long)]
    pub caches_root: Option<PathBuf>,
    /// Output directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DifferencesArgs {
    #[command(flatten)]
    pub cache: CacheArgs,
    /// Only compare these indices
    #[arg(long, num_args = 1..)]
    pub include: Vec<IndexType>,
    /// Never compare these indices; wins over --include
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<IndexType>,
}

#[derive(Args, Debug)]
pub struct TreeDiffArgs {
    #[arg(long)]
    pub old: PathBuf,
    #[arg(long)]
    pub new: PathBuf,
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct GamevalArgs {
    #[command(flatten)]
    pub cache: CacheArgs,
    /// Types to compare; all types when omitted
    #[arg(long, num_args = 1..)]
    pub types: Vec<GameValType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_differences() {
        let cli = Cli::try_parse_from(["cachewatch", "differences", "--old", "230", "--new", "231"]).unwrap();
        if let Command::Differences(args) = cli.command {
            assert_eq!(args.cache.old, "230");
            assert_eq!(args.cache.new, "231");
            assert!(args.include.is_empty());
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_diffs_alias_with_filters() {
        let cli = Cli::try_parse_from([
            "cachewatch", "diffs", "--old", "230", "--new", "latest",
            "--include", "configs", "sprites", "--exclude", "8", "--format", "json",
        ])
        .unwrap();
        if let Command::Differences(args) = cli.command {
            assert_eq!(args.include, vec![IndexType::Configs, IndexType::Sprites]);
            assert_eq!(args.exclude, vec![IndexType::Sprites]);
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_unknown_index_fails() {
        assert!(Cli::try_parse_from([
            "cachewatch", "differences", "--old", "1", "--new", "2", "--include", "bogus",
        ])
        .is_err());
    }

    #[test]
    fn parse_tree_diff() {
        let cli = Cli::try_parse_from(["cachewatch", "tree-diff", "--old", "a", "--new", "b", "--out", "c"]).unwrap();
        if let Command::TreeDiff(args) = cli.command {
            assert_eq!(args.out, PathBuf::from("c"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_gameval_types() {
        let cli = Cli::try_parse_from([
            "cachewatch", "gameval", "--old", "230", "--new", "231", "--types", "items", "npcs", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        if let Command::Gameval(args) = cli.command {
            assert_eq!(args.types, vec![GameValType::Items, GameValType::Npcs]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn missing_new_version_fails() {
        assert!(Cli::try_parse_from(["cachewatch", "gameval", "--old", "230"]).is_err());
    }
}
