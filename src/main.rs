//! Tetdeck CLI Application

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tetdeck::config::DeckConfig;
use tetdeck::contact::MembershipPolicy;
use tetdeck::io::{read_deck_mesh, write_deck_file, write_tet_mesh_vtu, RunReport, Scene};
use tetdeck::pipeline::{DeckBuilder, Stage};

mod cli;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let hide_progress = cli.hide_progress();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Build {
            scene,
            output,
            config,
            policy,
            order,
            tetgen,
            timeout,
            work_dir,
            vtu,
            report,
        } => {
            let overrides = Overrides {
                policy,
                order,
                tetgen,
                timeout,
                work_dir,
            };
            let config = load_config(config.as_deref(), overrides)?;
            cmd_build(&scene, &output, &config, vtu, report, hide_progress)
        }
        Commands::Info { deck } => cmd_info(&deck),
        Commands::InitConfig { path } => cmd_init_config(&path),
    }
}

/// Command line values that take precedence over the configuration file
struct Overrides {
    policy: Option<MembershipPolicy>,
    order: Option<Vec<String>>,
    tetgen: Option<PathBuf>,
    timeout: Option<u64>,
    work_dir: Option<PathBuf>,
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<DeckConfig> {
    let mut config = match path {
        Some(path) => DeckConfig::from_file(path)
            .with_context(|| format!("while loading configuration {}", path.display()))?,
        None => DeckConfig::default(),
    };

    if let Some(policy) = overrides.policy {
        config.tagging.policy = policy;
    }
    if overrides.order.is_some() {
        config.object_order = overrides.order;
    }
    if let Some(tetgen) = overrides.tetgen {
        config.tetgen.executable = tetgen;
    }
    if let Some(timeout) = overrides.timeout {
        config.tetgen.timeout_secs = timeout;
    }
    if overrides.work_dir.is_some() {
        config.tetgen.work_dir = overrides.work_dir;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_build(
    scene_path: &Path,
    output: &Path,
    config: &DeckConfig,
    vtu: Option<PathBuf>,
    report: Option<PathBuf>,
    hide_progress: bool,
) -> anyhow::Result<()> {
    let scene = Scene::from_file(scene_path)
        .with_context(|| format!("while reading scene {}", scene_path.display()))?;

    let bar = if hide_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(scene.objects.len() as u64 * 2)
    };
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{bar:30}] {pos}/{len} {msg}",
    )?);

    let assembled = DeckBuilder::new(config)
        .build(&scene, |stage, name| {
            let verb = match stage {
                Stage::Meshing => "meshing",
                Stage::Tagging => "tagging",
            };
            bar.set_message(format!("{} {}", verb, name));
            bar.inc(1);
        })
        .with_context(|| format!("while building deck from {}", scene_path.display()))?;
    bar.finish_and_clear();

    write_deck_file(output, &assembled.mesh, &assembled.ground_nodes, config)
        .with_context(|| format!("while writing deck {}", output.display()))?;

    if let Some(path) = &vtu {
        write_tet_mesh_vtu(&assembled.mesh, &assembled.ground_nodes, path, None)?;
    }

    if let Some(path) = &report {
        RunReport::new(
            scene_path.display().to_string(),
            output.display().to_string(),
            config,
            assembled.objects.clone(),
            &assembled.mesh,
            assembled.ground_nodes.len(),
        )
        .export(path)?;
    }

    println!("\n{}", "=".repeat(60));
    println!("DECK WRITTEN: {}", output.display());
    println!("{}", "=".repeat(60));
    println!();
    println!("  Policy:       {}", config.tagging.policy);
    println!("  Nodes:        {}", assembled.mesh.num_nodes());
    println!("  Elements:     {}", assembled.mesh.num_elements());
    println!("  Master faces: {}", assembled.mesh.masters.len());
    println!("  Slave faces:  {}", assembled.mesh.slaves.len());
    println!("  Ground nodes: {}", assembled.ground_nodes.len());
    println!();

    println!("Objects:");
    for object in &assembled.objects {
        println!(
            "  - {} ({}): nodes {}..{}, {} elements, {} tagged faces",
            object.name,
            object.role,
            object.first_node_id,
            object.first_node_id + object.nodes.saturating_sub(1),
            object.elements,
            object.tagged_faces
        );
    }
    println!();

    if let Some(path) = &vtu {
        println!("  VTU:    {}", path.display());
    }
    if let Some(path) = &report {
        println!("  Report: {}", path.display());
    }

    println!("{}", "=".repeat(60));

    Ok(())
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    println!("Reading deck: {}", path.display());

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("while reading deck {}", path.display()))?;
    let deck = read_deck_mesh(&text)?;

    println!("\n{}", "=".repeat(60));
    println!("DECK INFORMATION");
    println!("{}", "=".repeat(60));
    println!();
    println!("  Nodes:        {}", deck.nodes.len());
    println!("  Elements:     {}", deck.elements.len());
    println!("  Fixed nodes:  {}", deck.fixed_nodes.len());
    println!("  Slave faces:  {}", deck.slaves.len());
    println!("  Master faces: {}", deck.masters.len());
    println!();
    println!("{}", "=".repeat(60));

    Ok(())
}

fn cmd_init_config(path: &Path) -> anyhow::Result<()> {
    DeckConfig::default().to_file(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
