use super::{current_dir, load_run_config, run_job};
use crate::cli::CpptrajArgs;
use crate::error::Result;
use amberflow::engine::collaborator::Tool;
use amberflow::workflows::cpptraj::{self, CpptrajParameters};
use std::path::Path;

pub async fn run(args: CpptrajArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_run_config(config_path, Tool::Cpptraj, &args.run)?;
    let plan = cpptraj::prepare(&parameters(args), &current_dir()?)?;
    run_job(plan, config).await
}

fn parameters(args: CpptrajArgs) -> CpptrajParameters {
    CpptrajParameters {
        input: args.input,
        topologies: args.topologies,
        trajectories_in: args.trajectories_in,
        references: args.references,
        data_in: args.data_in,
        trajectories_out: args.trajectories_out,
        data_out: args.data_out,
        output: args.output,
        log: args.log,
        trajectory_in_args: args.trajectory_in_args,
        trajectory_out_args: args.trajectory_out_args,
        print_lengths: args.print_lengths,
        interactive: args.interactive,
        defines: args.defines,
        version: args.tool_version,
        debug: args.debug,
        atom_mask: args.atom_mask,
        residue_mask: args.residue_mask,
        mask: args.mask,
        resmask: args.resmask,
        rng: args.rng,
    }
}
