use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use cw_cache::{CacheLocator, CacheProvider};
use cw_decode::DecoderRegistry;
use cw_diff::{ArtifactWriter, FsTreeSource, TreeWalker, WalkReport};
use cw_dispatch::{ChangeDispatcher, ListenerRegistry};
use cw_engine::{CacheComparator, ComparisonReport, EngineConfig};
use cw_gameval::{build_mapping, compare, GameValReport, GameValType};
use cw_pages::{DirectoryDocumentBuilder, PageContext};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Differences(args) => cmd_differences(args, format).await,
        Command::TreeDiff(args) => cmd_tree_diff(args, format).await,
        Command::Gameval(args) => cmd_gameval(args, format).await,
    }
}

/// Config file values, overridden by command-line flags.
async fn load_config(args: &CacheArgs) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).await?,
        None => EngineConfig::default(),
    };
    if let Some(root) = &args.caches_root {
        config.caches_root = root.clone();
    }
    if let Some(out) = &args.out {
        config.output_root = out.clone();
    }
    Ok(config)
}

async fn open_caches(
    config: &EngineConfig,
    args: &CacheArgs,
) -> anyhow::Result<(Arc<dyn CacheProvider>, Arc<dyn CacheProvider>)> {
    let locator = CacheLocator::new(&config.caches_root);
    let old = locator
        .open(&args.old)
        .await
        .with_context(|| format!("cannot open old cache '{}'", args.old))?;
    let new = locator
        .open(&args.new)
        .await
        .with_context(|| format!("cannot open new cache '{}'", args.new))?;
    Ok((Arc::new(old), Arc::new(new)))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_differences(args: DifferencesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_config(&args.cache).await?;
    if !args.include.is_empty() {
        config.include = args.include;
    }
    if !args.exclude.is_empty() {
        config.exclude = args.exclude;
    }
    let (old, new) = open_caches(&config, &args.cache).await?;

    let pages_root = config.output_root.join("pages");
    let ctx = PageContext::new(
        Arc::new(DecoderRegistry::with_json_decoders()),
        Arc::new(DirectoryDocumentBuilder::new(&pages_root)),
    );
    let mut registry = ListenerRegistry::new();
    cw_pages::register_all(&mut registry, Arc::new(ctx));
    let dispatcher = ChangeDispatcher::with_config(Arc::new(registry), config.dispatch_config());

    let report = CacheComparator::new(Arc::clone(&old), Arc::clone(&new), Arc::new(dispatcher))
        .with_filter(config.filter())
        .with_max_concurrency(config.max_concurrency)
        .run()
        .await;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_comparison(old.version(), new.version(), &report, &pages_root);
            Ok(())
        }
    }
}

fn print_comparison(old: &str, new: &str, report: &ComparisonReport, pages_root: &Path) {
    println!("Compared cache {} with {}", old.yellow(), new.yellow().bold());
    println!("  {} {}", "added:".green(), report.added);
    println!("  {} {}", "removed:".red(), report.removed);
    println!("  {} {}", "modified:".cyan(), report.modified);
    println!("  {} {}", "unchanged:".dimmed(), report.unchanged);
    if report.read_failures + report.enumeration_failures > 0 {
        println!(
            "  {} {} unreadable entries, {} unlisted subtrees",
            "skipped:".yellow(),
            report.read_failures,
            report.enumeration_failures
        );
    }
    if report.failed_comparisons > 0 {
        println!(
            "{} {} entry comparisons failed (see log)",
            "!".red().bold(),
            report.failed_comparisons
        );
    }
    let dispatch = report.dispatch;
    if dispatch.failed > 0 {
        println!(
            "{} {} of {} listeners failed (see log)",
            "!".red().bold(),
            dispatch.failed,
            dispatch.matched
        );
    } else {
        println!("{} {} listeners ran", "✓".green().bold(), dispatch.succeeded);
    }
    println!("Pages: {}", pages_root.display());
}

async fn cmd_tree_diff(args: TreeDiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    for dir in [&args.old, &args.new] {
        if !tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            bail!("{} is not a directory", dir.display());
        }
    }
    let walker = TreeWalker::new(
        Arc::new(FsTreeSource::new(&args.old)),
        Arc::new(FsTreeSource::new(&args.new)),
        ArtifactWriter::new(&args.out),
    );
    let report = walker.walk().await;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_walk(&report, &args.out);
            Ok(())
        }
    }
}

fn print_walk(report: &WalkReport, out: &Path) {
    println!("  {} {}", "added:".green(), report.added);
    println!("  {} {}", "removed:".red(), report.removed);
    println!("  {} {}", "changed:".cyan(), report.changed);
    println!("  {} {}", "unchanged:".dimmed(), report.unchanged);
    println!("  {} {}", "skipped:".dimmed(), report.skipped);
    if report.failed > 0 {
        println!("{} {} entries failed (see log)", "!".red().bold(), report.failed);
    }
    println!("{} {} artifacts in {}", "✓".green().bold(), report.artifacts(), out.display());
}

async fn cmd_gameval(args: GamevalArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(&args.cache).await?;
    let (old, new) = open_caches(&config, &args.cache).await?;
    let types = if args.types.is_empty() {
        GameValType::ALL.to_vec()
    } else {
        args.types
    };

    let (old_mapping, new_mapping) = tokio::join!(
        build_mapping(old.as_ref(), &types),
        build_mapping(new.as_ref(), &types)
    );
    let changes = compare(&old_mapping, &new_mapping);
    let report = GameValReport::new(old.version(), new.version(), old_mapping, new_mapping, changes);

    let out = config.output_root.join("gameval");
    let written = report.write_to(&out).await?;

    match format {
        OutputFormat::Json => print_json(&report.changes),
        OutputFormat::Text => {
            let summary = &report.summary;
            println!(
                "GameVal ids {} -> {}: {} changed",
                summary.old_version.yellow(),
                summary.new_version.yellow().bold(),
                summary.total_changes.to_string().bold()
            );
            for (ty, names) in &report.changes {
                println!("  {}", ty.to_string().cyan());
                for (name, change) in names {
                    println!("    {name}: {} -> {}", change.old_id, change.new_id);
                }
            }
            for ty in &summary.failed_types {
                println!("  {} {} had no names", "!".red().bold(), ty);
            }
            for path in written {
                println!("{} {}", "wrote".green(), path.display());
            }
            Ok(())
        }
    }
}
