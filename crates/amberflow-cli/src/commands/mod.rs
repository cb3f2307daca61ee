pub mod cpptraj;
pub mod pdb4amber;
pub mod scan;
pub mod tleap;

use crate::cli::RunArgs;
use crate::config::{PartialConfig, RunConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use amberflow::engine::collaborator::Tool;
use amberflow::engine::local::LocalSandbox;
use amberflow::engine::progress::ProgressReporter;
use amberflow::workflows::{self, JobPlan, JobSettings};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(CliError::Io)
}

pub fn load_run_config(config_path: Option<&Path>, tool: Tool, args: &RunArgs) -> Result<RunConfig> {
    let partial = PartialConfig::load(config_path)?;
    info!("Merging configuration from file and CLI arguments...");
    partial.merge_with_cli(tool, args)
}

/// Prints the plan, then runs it in a local sandbox unless this is a dry run.
pub async fn run_job(plan: JobPlan, config: RunConfig) -> Result<()> {
    print!("{}", describe_plan(&plan, &config));

    if config.dry_run {
        println!("Dry run: nothing was submitted.");
        return Ok(());
    }

    let sandbox = LocalSandbox::new(&config.work_dir).with_output_dir(&config.output_dir);
    let settings =
        JobSettings::new(plan.tool, &config.executable).with_description(config.description);
    let progress_handler = CliProgressHandler::new();
    let callback = progress_handler.get_callback();

    println!("Running {}...", plan.tool);
    info!("Invoking the job workflow in {:?}", &config.work_dir);

    let retrieved = tokio::task::spawn_blocking(move || {
        let reporter = ProgressReporter::with_callback(callback);
        workflows::run(&plan, &sandbox, &settings, &reporter)
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Job task failed: {}", e)))??;

    println!("Retrieved {} file(s):", retrieved.files.len());
    for file in &retrieved.files {
        println!("  {} -> {}", file.name, file.path.display());
    }
    Ok(())
}

fn describe_plan(plan: &JobPlan, config: &RunConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("Tool:        {}\n", plan.tool));
    out.push_str(&format!("Executable:  {}\n", config.executable.display()));
    out.push_str(&format!("Arguments:   {}\n", plan.command_line));
    out.push_str(&format!("Work dir:    {}\n", config.work_dir.display()));
    out.push_str(&format!("Output dir:  {}\n", config.output_dir.display()));

    out.push_str(&format!("Inputs ({}):\n", plan.total_inputs()));
    for (label, path) in plan
        .primary_inputs
        .iter()
        .chain(plan.manifest.files().iter())
    {
        out.push_str(&format!("  {:<20} {}\n", label, path.display()));
    }
    for (bundle, members) in plan.manifest.dirs() {
        for (relative, path) in members {
            out.push_str(&format!(
                "  {:<20} {}\n",
                format!("{}/{}", bundle, relative),
                path.display()
            ));
        }
    }

    out.push_str("Expected outputs:\n");
    for name in plan.expected_outputs() {
        out.push_str(&format!("  {}\n", name));
    }
    out
}
