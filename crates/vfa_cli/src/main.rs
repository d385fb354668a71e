mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use vfa_core::config::ConfigManager;
use vfa_core::logging::{init_tracing, LogConfig, LogLevel, RunLoggerBuilder};
use vfa_core::orchestrator::{
    create_standard_pipeline, Context, DetectStep, MatchStep, Pipeline, PipelineError, RefineStep,
    RunState,
};

use cli::{ApplyOverrides, Cli, Commands, ConfigAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Run output goes through the run logger; tracing is for diagnostics
    let level = match cli.verbose {
        0 => LogLevel::Warn,
        n => LogLevel::from_verbosity(n - 1),
    };
    init_tracing(level);

    match cli.command {
        Commands::Detect { paths, detection } => run_pipeline(
            &cli.config,
            &paths.run_name,
            &[&paths, &detection],
            Pipeline::new().with_step(DetectStep::new()),
            cli.verbose,
        ),
        Commands::Match { paths, matching } => run_pipeline(
            &cli.config,
            &paths.run_name,
            &[&paths, &matching],
            Pipeline::new().with_step(MatchStep::new()),
            cli.verbose,
        ),
        Commands::Refine { paths, refinement } => run_pipeline(
            &cli.config,
            &paths.run_name,
            &[&paths, &refinement],
            Pipeline::new().with_step(RefineStep::new()),
            cli.verbose,
        ),
        Commands::Run {
            paths,
            detection,
            matching,
            refinement,
        } => run_pipeline(
            &cli.config,
            &paths.run_name,
            &[&paths, &detection, &matching, &refinement],
            create_standard_pipeline(),
            cli.verbose,
        ),
        Commands::Config { action } => config_command(&cli.config, action),
    }
}

fn load_config(path: &Path) -> Result<ConfigManager> {
    tracing::debug!("Using config {}", path.display());
    let mut manager = ConfigManager::new(path);
    manager
        .load_or_create()
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    Ok(manager)
}

fn run_pipeline(
    config_path: &Path,
    run_name: &str,
    overrides: &[&dyn ApplyOverrides],
    pipeline: Pipeline,
    verbose: u8,
) -> Result<()> {
    let mut manager = load_config(config_path)?;
    for o in overrides {
        o.apply(manager.settings_mut());
    }
    manager
        .ensure_dirs_exist()
        .context("Failed to create output directories")?;

    let mut log_config = LogConfig::from_settings(&manager.settings().logging);
    if verbose >= 2 {
        log_config.level = LogLevel::Debug;
    }
    let logger = RunLoggerBuilder::new(run_name, manager.logs_folder())
        .config(log_config)
        .callback(Box::new(|line: &str| println!("{}", line)))
        .build()
        .context("Failed to create run log")?;
    let logger = Arc::new(logger);

    let settings = manager.settings().clone();
    let ctx = Context::from_settings(settings, run_name, Arc::clone(&logger))
        .map_err(|e| PipelineError::setup_failed(run_name, e))?;
    let mut state = RunState::new(run_name);

    let outcome = pipeline.run(&ctx, &mut state);
    logger.close();
    let result = outcome?;

    println!();
    println!("Steps completed: {}", result.steps_completed.join(", "));
    if let Some(ref detection) = state.detection {
        println!(
            "Keyframes: {} original, {} recorded -> {}",
            detection.original_keyframes.len(),
            detection.recorded_keyframes.len(),
            ctx.artifacts.keyframes().display()
        );
    }
    if let Some(ref matching) = state.matching {
        println!(
            "Matches: {}/{} accepted -> {}",
            matching.accepted,
            matching.matches.len(),
            ctx.artifacts.editable_matches().display()
        );
    }
    if let Some(ref refinement) = state.refinement {
        let summary = &refinement.summary;
        println!(
            "Report: {} rows ({} matched, {} frames uncovered) -> {}",
            summary.rows,
            summary.matched,
            summary.uncovered_frames,
            ctx.artifacts.compare_results().display()
        );
        if refinement.worker_failures > 0 {
            println!("Worker failures: {}", refinement.worker_failures);
        }
    }
    println!("Log: {}", logger.log_path().display());
    Ok(())
}

fn config_command(config_path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            ConfigManager::new(config_path)
                .save()
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("Wrote {}", config_path.display());
        }
        ConfigAction::Show => {
            let manager = load_config(config_path)?;
            print!("{}", manager.to_toml()?);
        }
        ConfigAction::Set { key, value } => {
            let mut manager = load_config(config_path)?;
            let section = manager
                .set_value(&key, &value)
                .with_context(|| format!("Failed to set {}", key))?;
            println!("Updated [{}] in {}", section.table_name(), config_path.display());
        }
    }
    Ok(())
}
