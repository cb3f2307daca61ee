use super::{current_dir, load_run_config, run_job};
use crate::cli::Pdb4amberArgs;
use crate::error::Result;
use amberflow::engine::collaborator::Tool;
use amberflow::workflows::pdb4amber::{self, Pdb4amberParameters};
use std::path::Path;

pub async fn run(args: Pdb4amberArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_run_config(config_path, Tool::Pdb4amber, &args.run)?;
    let plan = pdb4amber::prepare(&parameters(args), &current_dir()?)?;
    run_job(plan, config).await
}

fn parameters(args: Pdb4amberArgs) -> Pdb4amberParameters {
    Pdb4amberParameters {
        input: args.input,
        output: args.output,
        logfile: args.logfile,
        leap_template: args.leap_template,
        nohyd: args.nohyd,
        dry: args.dry,
        prot: args.prot,
        amber_compatible_residues: args.amber_compatible_residues,
        constantph: args.constantph,
        most_populous: args.most_populous,
        keep_altlocs: args.keep_altlocs,
        reduce: args.reduce,
        no_reduce_db: args.no_reduce_db,
        add_missing_atoms: args.add_missing_atoms,
        no_conect: args.no_conect,
        noter: args.noter,
        strip: args.strip,
        mutate: args.mutate,
        residue_name: args.residue_name,
        model: args.model,
        pdbid: args.pdbid,
    }
}
