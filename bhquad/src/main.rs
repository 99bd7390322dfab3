use bhquad::{advance, bench_forces, bench_steps, IntegratorConfig, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Headless 2D Barnes-Hut N-body simulation")]
struct Args {
    /// Scenario YAML; a bare name is looked up in the crate's scenarios/ directory
    #[arg(short, long = "file", default_value = "galaxy.yaml")]
    file_name: String,

    /// Override the number of frames from the scenario
    #[arg(long)]
    steps: Option<usize>,

    /// Override the integration scheme (`leapfrog` or `kdk`)
    #[arg(long)]
    integrator: Option<IntegratorConfig>,

    /// Run the direct vs quadtree benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

fn scenario_path(file_name: &str) -> PathBuf {
    let given = PathBuf::from(file_name);
    if given.exists() {
        return given;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = scenario_path(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_forces()?;
        bench_steps()?;
        return Ok(());
    }

    let mut scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    if let Some(integrator) = args.integrator {
        scenario_cfg.engine.integrator = integrator;
    }
    let log_every = scenario_cfg.parameters.log_every.unwrap_or(100).max(1);

    let mut scenario = Scenario::build_scenario(scenario_cfg).context("invalid scenario")?;
    let steps = args.steps.unwrap_or(scenario.parameters.steps);

    let Scenario {
        engine,
        parameters,
        system,
        ..
    } = &mut scenario;

    for frame in 1..=steps {
        let stats = advance(system, engine, parameters)
            .with_context(|| format!("frame {frame} at t = {} failed", system.t))?;

        if frame % log_every == 0 || frame == steps {
            let p = system.total_momentum();
            let com = system.center_of_mass().unwrap_or_default();
            info!(
                "frame {frame}: t = {:.3}, indexed {}/{}, nodes {}, depth {}, momentum ({:.4e}, {:.4e}), com ({:.4e}, {:.4e})",
                system.t,
                stats.indexed,
                system.bodies.len(),
                stats.nodes,
                stats.depth,
                p.x,
                p.y,
                com.x,
                com.y
            );
        }
    }

    Ok(())
}
