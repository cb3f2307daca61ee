use super::{JobPlan, file_name};
use crate::core::script::directive::Dialect;
use crate::core::script::scanner::scan_file;
use crate::engine::collaborator::{CommandLine, Tool};
use crate::engine::error::EngineError;
use crate::engine::resolver::{ArtifactManifest, ArtifactResolver, output_name};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const DEFAULT_SCRIPT: &str = "cpptraj.inp";
pub const SCRIPT_LINK: &str = "input_file";

/// Options of a cpptraj run.
///
/// File-valued inputs are references in the same form a script would use
/// (`top.prmtop`, `md/prod.nc`). They are resolved and staged like script inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpptrajParameters {
    /// `-i`. When unset, `cpptraj.inp` is used if present.
    pub input: Option<PathBuf>,
    pub topologies: Vec<String>,
    pub trajectories_in: Vec<String>,
    pub references: Vec<String>,
    pub data_in: Vec<String>,
    pub trajectories_out: Vec<String>,
    pub data_out: Option<String>,
    pub output: Option<String>,
    pub log: Option<String>,
    pub trajectory_in_args: Vec<String>,
    pub trajectory_out_args: Vec<String>,
    pub print_lengths: bool,
    pub interactive: bool,
    pub defines: bool,
    pub version: bool,
    pub debug: Option<u32>,
    pub atom_mask: Option<String>,
    pub residue_mask: Option<String>,
    pub mask: Option<String>,
    pub resmask: Option<String>,
    pub rng: Option<String>,
}

#[instrument(skip_all, name = "cpptraj_prepare")]
pub fn prepare(params: &CpptrajParameters, base_dir: &Path) -> Result<JobPlan, EngineError> {
    let resolver = ArtifactResolver::new(base_dir);
    let mut primary_inputs = IndexMap::new();
    let mut command_line = CommandLine::new();

    let script = match &params.input {
        Some(path) => Some(base_dir.join(path)),
        None => {
            let default = base_dir.join(DEFAULT_SCRIPT);
            if default.is_file() {
                Some(default)
            } else {
                warn!(
                    "No -i given and no '{}' found; running from command-line options only.",
                    DEFAULT_SCRIPT
                );
                None
            }
        }
    };

    let mut manifest = match &script {
        Some(script) => {
            let scanned = scan_file(script, Dialect::Cpptraj)?;
            let script_dir = script.parent().unwrap_or(base_dir);
            command_line = command_line.option("-i", file_name(script));
            primary_inputs.insert(SCRIPT_LINK.to_string(), script.clone());
            ArtifactResolver::new(script_dir).resolve(&scanned)?
        }
        None => ArtifactManifest::new(),
    };

    let inputs: [(&str, &[String]); 4] = [
        ("-p", &params.topologies),
        ("-y", &params.trajectories_in),
        ("-c", &params.references),
        ("-d", &params.data_in),
    ];
    for (flag, references) in inputs {
        for reference in references {
            let resolved = resolver.resolve_reference(reference)?;
            command_line = command_line.option(flag, resolved.sandbox_path());
            manifest.insert(resolved)?;
        }
    }

    for reference in &params.trajectories_out {
        command_line = push_output(command_line, &mut manifest, "-x", reference);
    }
    let outputs = [
        ("-w", &params.data_out),
        ("-o", &params.output),
        ("--log", &params.log),
    ];
    for (flag, reference) in outputs {
        if let Some(reference) = reference {
            command_line = push_output(command_line, &mut manifest, flag, reference);
        }
    }

    let command_line = command_line
        .repeated("-ya", &params.trajectory_in_args)
        .repeated("-xa", &params.trajectory_out_args)
        .switch("-tl", params.print_lengths)
        .switch("--interactive", params.interactive)
        .switch("--defines", params.defines)
        .switch("-V", params.version)
        .option_opt("-debug", params.debug)
        .option_opt("-ms", params.atom_mask.as_ref())
        .option_opt("-mr", params.residue_mask.as_ref())
        .option_opt("-mask", params.mask.as_ref())
        .option_opt("--resmask", params.resmask.as_ref())
        .option_opt("--rng", params.rng.as_ref());

    info!(
        "Prepared cpptraj job with {} staged input(s) and {} expected output(s).",
        manifest.input_count() + primary_inputs.len(),
        manifest.outfiles().len()
    );

    Ok(JobPlan {
        tool: Tool::Cpptraj,
        command_line,
        primary_inputs,
        manifest,
    })
}

/// Outputs land in the sandbox root, so only the file name reaches the tool.
fn push_output(
    command_line: CommandLine,
    manifest: &mut ArtifactManifest,
    flag: &str,
    reference: &str,
) -> CommandLine {
    manifest.push_outfile(reference);
    command_line.option(flag, output_name(reference))
}
