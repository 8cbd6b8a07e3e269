//! Particle effect command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde::Serialize;
use snowstorm_particles::{
    ComponentRegistry, EmitterFrame, EmitterStats, ParticleDefinition, SimulationManager,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::utils::{add_table_row, create_table, definition_paths, load_config, load_library};

#[derive(Subcommand)]
pub enum EffectCommands {
    /// Display information about particle definitions
    Info {
        /// Definition file, or a directory searched for `*.json`
        path: PathBuf,

        /// List every component and whether it is supported
        #[arg(long)]
        components: bool,
    },

    /// Run a headless simulation and report the final state
    Simulate {
        /// Definition file, or a directory searched for `*.json`
        path: PathBuf,

        /// Effect to spawn, by identifier or file stem (repeatable; default: all)
        #[arg(short, long)]
        effect: Vec<String>,

        /// Number of ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,

        /// Seconds per tick, overriding the config file
        #[arg(long)]
        dt: Option<f32>,

        /// Seed for reproducible runs, overriding the config file
        #[arg(long)]
        seed: Option<u64>,

        /// Simulation config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emitter position as X,Y,Z
        #[arg(long, default_value = "0,0,0", value_parser = parse_position, allow_hyphen_values = true)]
        position: [f64; 3],

        /// Print statistics and final render frames as JSON
        #[arg(long)]
        json: bool,
    },
}

struct SimulateArgs {
    path: PathBuf,
    effects: Vec<String>,
    ticks: u64,
    dt: Option<f32>,
    seed: Option<u64>,
    config: Option<PathBuf>,
    position: [f64; 3],
    json: bool,
}

#[derive(Serialize)]
struct SimulationReport {
    stats: EmitterStats,
    frames: Vec<EmitterFrame>,
}

pub fn execute(command: EffectCommands) -> Result<()> {
    match command {
        EffectCommands::Info { path, components } => info_command(&path, components),
        EffectCommands::Simulate {
            path,
            effect,
            ticks,
            dt,
            seed,
            config,
            position,
            json,
        } => simulate_command(SimulateArgs {
            path,
            effects: effect,
            ticks,
            dt,
            seed,
            config,
            position,
            json,
        }),
    }
}

fn info_command(path: &Path, components: bool) -> Result<()> {
    let registry = ComponentRegistry::builtin();
    let paths = definition_paths(path)?;
    if paths.is_empty() {
        bail!("No particle definitions found in {}", path.display());
    }

    if let [file] = paths.as_slice() {
        let definition = ParticleDefinition::from_path(file)
            .with_context(|| format!("Failed to load particle definition: {}", file.display()))?;
        print_definition(file, &definition, &registry, components);
        return Ok(());
    }

    let mut table = create_table(&["File", "Identifier", "Material", "Components", "Curves"]);
    for file in &paths {
        let definition = match ParticleDefinition::from_path(file) {
            Ok(definition) => definition,
            Err(e) => {
                log::warn!("Skipping {}: {e}", file.display());
                continue;
            }
        };
        add_table_row(
            &mut table,
            vec![
                file.strip_prefix(path).unwrap_or(file).display().to_string(),
                definition.identifier().to_string(),
                definition.material().to_string(),
                definition.components().count().to_string(),
                definition.curves().count().to_string(),
            ],
        );
    }

    println!("Particle Effects");
    println!("================");
    println!();
    table.printstd();
    Ok(())
}

fn print_definition(
    file: &Path,
    definition: &ParticleDefinition,
    registry: &ComponentRegistry,
    list_components: bool,
) {
    let unsupported = definition
        .components()
        .filter(|(id, _)| !registry.contains(id))
        .count();

    println!("Particle Effect Information");
    println!("===========================");
    println!();
    println!("File: {}", file.display());
    println!("Identifier: {}", definition.identifier());
    println!("Format Version: {}", definition.format_version);
    println!("Material: {}", definition.material());
    println!("Texture: {}", display_or_none(definition.texture()));
    println!(
        "Components: {} ({unsupported} unsupported)",
        definition.components().count()
    );
    println!("Curves: {}", definition.curves().count());

    if list_components {
        println!();
        let mut table = create_table(&["Component", "Supported"]);
        for (id, _) in definition.components() {
            let supported = if registry.contains(id) { "yes" } else { "no" };
            add_table_row(&mut table, vec![id.to_string(), supported.to_string()]);
        }
        table.printstd();
    }
}

fn simulate_command(args: SimulateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dt) = args.dt {
        config.timestep = dt;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let library = load_library(&args.path)?;
    let effects = if args.effects.is_empty() {
        library
            .identifiers()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        args.effects
    };

    let mut manager = SimulationManager::new(
        config,
        Arc::new(ComponentRegistry::builtin()),
        Arc::new(library),
    )
    .context("Invalid simulation config")?;

    let [x, y, z] = args.position;
    for effect in &effects {
        if manager.spawn(effect, x, y, z).is_none() {
            bail!("No particle effect named '{effect}'");
        }
    }

    log::info!(
        "Simulating {} effects for {} ticks of {}s",
        effects.len(),
        args.ticks,
        manager.config().timestep
    );
    for _ in 0..args.ticks {
        manager.tick();
    }

    let report = SimulationReport {
        stats: manager.stats(),
        frames: manager.render(0.0),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize simulation")?;
        println!("{json}");
        return Ok(());
    }

    println!("Simulation Summary");
    println!("==================");
    println!();
    if report.frames.is_empty() {
        println!("No emitters left alive.");
    } else {
        let mut table = create_table(&["Emitter", "Effect", "Material", "Particles"]);
        for frame in &report.frames {
            add_table_row(
                &mut table,
                vec![
                    frame.id.to_string(),
                    frame.identifier.clone(),
                    frame.material.to_string(),
                    frame.particles.len().to_string(),
                ],
            );
        }
        table.printstd();
    }
    println!();
    println!("{}", report.stats);
    Ok(())
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}

/// Parses an `X,Y,Z` position.
fn parse_position(raw: &str) -> std::result::Result<[f64; 3], String> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in '{raw}': {e}"))?;
    <[f64; 3]>::try_from(parts).map_err(|_| format!("expected X,Y,Z, got '{raw}'"))
}
