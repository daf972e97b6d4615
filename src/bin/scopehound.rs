// src/bin/scopehound.rs
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use scopehound_core::engine::ContextEngine;
use scopehound_core::EngineConfig;

#[derive(Parser)]
#[command(name = "scopehound")]
#[command(about = "Ranks the files an AI assistant should see next")]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, short, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full analysis pass and persist the graph cache
    Analyze,
    /// Rank context neighbors for a selection of files
    Context {
        /// Selected files (project-relative)
        files: Vec<PathBuf>,
        /// Free-text task description feeding the keyword signal
        #[arg(long, short)]
        task: Option<String>,
    },
    /// List hub files (files imported by unusually many others)
    Hubs,
    /// List files sharing commits with the given file
    Peers { file: PathBuf },
    /// Append an ignore pattern for a path
    Ignore {
        path: PathBuf,
        /// Match the file name anywhere instead of this exact path
        #[arg(long)]
        by_name: bool,
    },
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    let config = EngineConfig::load(&root);
    let engine = ContextEngine::new(&root, config);

    match cli.command {
        Commands::Analyze => handle_analyze(&engine),
        Commands::Context { files, task } => handle_context(&engine, &files, task.as_deref()),
        Commands::Hubs => handle_hubs(&engine),
        Commands::Peers { file } => handle_peers(&engine, &file),
        Commands::Ignore { path, by_name } => handle_ignore(&engine, &path, by_name),
    }
}

fn handle_analyze(engine: &ContextEngine) -> Result<()> {
    println!("🔎 Analyzing project graph...");
    match engine.force_reanalyze().wait() {
        Ok(snapshot) => {
            println!(
                "{} {} files, {} hubs",
                "✓ analyzed".green(),
                snapshot.files.len(),
                snapshot.hub_files.len()
            );
            Ok(())
        }
        Err(e) => anyhow::bail!("analysis failed: {e}"),
    }
}

fn handle_context(
    engine: &ContextEngine,
    files: &[PathBuf],
    task: Option<&str>,
) -> Result<()> {
    wait_for_graph(engine)?;
    let result = engine.calculate_context(files, task);

    if !result.heuristic_seed_files.is_empty() {
        let names: Vec<String> = result
            .heuristic_seed_files
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!("🌱 Heuristic seeds: {}", names.join(", ").dimmed());
    }

    for (path, score) in &result.all_neighbors {
        let in_budget = result.prompt_neighbors.contains(path);
        let marker = if in_budget { "●".green() } else { "○".dimmed() };
        println!("{marker} {:<50} {:.1}", path.display().to_string().blue(), score);
    }
    println!(
        "\n📊 {} ranked, {} within the token budget",
        result.all_neighbors.len(),
        result.prompt_neighbors.len().to_string().yellow().bold()
    );
    Ok(())
}

fn handle_hubs(engine: &ContextEngine) -> Result<()> {
    wait_for_graph(engine)?;
    let hubs = engine.hub_files();
    if hubs.is_empty() {
        println!("No hub files detected.");
        return Ok(());
    }
    for hub in hubs {
        let dependents = engine.dependents_for_file(&hub).len();
        println!(
            "{:<50} [{} dependents]",
            hub.display().to_string().blue(),
            dependents.to_string().red()
        );
    }
    Ok(())
}

fn handle_peers(engine: &ContextEngine, file: &PathBuf) -> Result<()> {
    wait_for_graph(engine)?;
    let peers = engine.shared_commit_peers(file);
    if peers.is_empty() {
        println!("No shared-commit peers for {}.", file.display());
        return Ok(());
    }
    for (peer, count) in peers {
        println!(
            "{:<50} {} shared commits",
            peer.display().to_string().blue(),
            count.to_string().yellow()
        );
    }
    Ok(())
}

fn handle_ignore(engine: &ContextEngine, path: &PathBuf, by_name: bool) -> Result<()> {
    if engine.add_ignore_pattern(path, by_name) {
        println!("{} pattern added for {}", "✓".green(), path.display());
    } else {
        println!("Pattern already present (or could not be written).");
    }
    Ok(())
}

/// Commands that read the graph block until the bootstrap pass (if
/// any) finishes, so a cold start still prints real data.
fn wait_for_graph(engine: &ContextEngine) -> Result<()> {
    if engine.snapshot().files.is_empty() {
        let _ = engine.force_reanalyze().wait();
    }
    Ok(())
}
