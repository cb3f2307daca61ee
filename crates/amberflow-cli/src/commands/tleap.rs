use super::{current_dir, load_run_config, run_job};
use crate::cli::TleapArgs;
use crate::error::Result;
use amberflow::engine::collaborator::Tool;
use amberflow::workflows::tleap::{self, TleapParameters};
use std::path::Path;
use tracing::info;

pub async fn run(args: TleapArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_run_config(config_path, Tool::Tleap, &args.run)?;

    let params = TleapParameters {
        script: args.script,
        include_dirs: args.include_dirs,
    };
    info!("Scanning tleap script {:?}", &params.script);
    let plan = tleap::prepare(&params, &current_dir()?)?;

    run_job(plan, config).await
}
