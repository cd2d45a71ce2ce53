use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use omnifog_patcher::{find_candidates, run, ApplyOptions, PatchError, ENGINE_SRC};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "omnifog-patcher")]
#[command(about = "Widen forward-only fog visibility to all four directions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the engine sources in place
    Apply {
        /// Path to the game repository root (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Dry run - report what would change without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List candidate files without touching them
    Scan {
        /// Path to the game repository root (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply { root, dry_run, diff } => cmd_apply(root, dry_run, diff),
        Commands::Scan { root } => cmd_scan(root),
    }
}

fn resolve_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    match cli_root {
        Some(path) => Ok(path),
        None => Ok(env::current_dir()?),
    }
}

/// Print the diagnostic for a fatal run condition and exit with code 2.
fn fail(error: &PatchError) -> ! {
    eprintln!("{} {}", "ERROR:".red().bold(), error);
    std::process::exit(2);
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Show unified diff between original and patched content.
fn display_diff(file: &str, original: &str, patched: &str) {
    println!("\n{}", format!("--- {file} (original)").dimmed());
    println!("{}", format!("+++ {file} (patched)").dimmed());

    let diff = TextDiff::from_lines(original, patched);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_apply(root: Option<PathBuf>, dry_run: bool, show_diff: bool) -> Result<()> {
    let root = resolve_root(root)?;
    let options = ApplyOptions { dry_run };

    let outcomes = match run(&root, &options) {
        Ok(outcomes) => outcomes,
        Err(e) if e.is_diagnosed() => fail(&e),
        Err(e) => return Err(e.into()),
    };

    if dry_run {
        println!("{}", "[DRY RUN - no files were modified]".cyan());
        println!("{}", "Omni-direction fog patch would apply:".bold());
    } else {
        println!("{}", "OK: omni-direction fog patch applied:".green().bold());
    }

    let verb = if dry_run { "would patch" } else { "patched" };
    for outcome in &outcomes {
        let rel = display_path(&outcome.file, &root);
        println!("- {verb} {rel} (changes={})", outcome.changes);

        if show_diff {
            display_diff(&rel, &outcome.original, &outcome.patched);
        }
    }

    Ok(())
}

fn cmd_scan(root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;

    let engine_src = root.join(ENGINE_SRC);
    if !engine_src.is_dir() {
        fail(&PatchError::EngineSrcMissing(engine_src));
    }

    let candidates = find_candidates(&engine_src);
    if candidates.is_empty() {
        fail(&PatchError::NoCandidates { engine_src });
    }

    println!(
        "{}",
        format!("{} candidate file(s):", candidates.len()).bold()
    );
    for path in &candidates {
        println!("- {}", display_path(path, &root));
    }

    Ok(())
}
