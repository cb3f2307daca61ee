use super::{JobPlan, file_name};
use crate::engine::collaborator::{CommandLine, Tool};
use crate::engine::error::{EngineError, InputKind};
use crate::engine::resolver::{ArtifactManifest, output_name};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const INPUT_LINK: &str = "input_file";

/// Options of a pdb4amber run. Every switch maps to the long flag of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pdb4amberParameters {
    pub input: PathBuf,
    pub output: Option<String>,
    pub logfile: Option<String>,
    pub leap_template: Option<String>,
    pub nohyd: bool,
    pub dry: bool,
    pub prot: bool,
    pub amber_compatible_residues: bool,
    pub constantph: bool,
    pub most_populous: bool,
    pub keep_altlocs: bool,
    pub reduce: bool,
    pub no_reduce_db: bool,
    pub add_missing_atoms: bool,
    pub no_conect: bool,
    pub noter: bool,
    pub strip: Option<String>,
    pub mutate: Option<String>,
    pub residue_name: Option<String>,
    pub model: Option<i32>,
    pub pdbid: bool,
}

impl Pdb4amberParameters {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }
}

#[instrument(skip_all, name = "pdb4amber_prepare")]
pub fn prepare(params: &Pdb4amberParameters, base_dir: &Path) -> Result<JobPlan, EngineError> {
    let mut manifest = ArtifactManifest::new();
    let mut primary_inputs = IndexMap::new();

    // With --pdbid the input names a structure to fetch, not a local file.
    let input_arg = if params.pdbid {
        params.input.display().to_string()
    } else {
        let input = base_dir.join(&params.input);
        if !input.is_file() {
            return Err(EngineError::MissingInputFile {
                reference: params.input.display().to_string(),
                kind: InputKind::File,
            });
        }
        let name = file_name(&input);
        primary_inputs.insert(INPUT_LINK.to_string(), input);
        name
    };

    let mut command_line = CommandLine::new().option("-i", input_arg);
    let outputs = [
        ("-o", &params.output),
        ("--logfile", &params.logfile),
        ("--leap-template", &params.leap_template),
    ];
    for (flag, reference) in outputs {
        if let Some(reference) = reference {
            manifest.push_outfile(reference);
            command_line = command_line.option(flag, output_name(reference));
        }
    }

    let command_line = command_line
        .switch("--nohyd", params.nohyd)
        .switch("--dry", params.dry)
        .switch("--prot", params.prot)
        .switch("--amber-compatible-residues", params.amber_compatible_residues)
        .switch("--constantph", params.constantph)
        .switch("--most-populous", params.most_populous)
        .switch("--keep-altlocs", params.keep_altlocs)
        .switch("--reduce", params.reduce)
        .switch("--no-reduce-db", params.no_reduce_db)
        .switch("--add-missing-atoms", params.add_missing_atoms)
        .switch("--no-conect", params.no_conect)
        .switch("--noter", params.noter)
        .switch("--pdbid", params.pdbid)
        .option_opt("--strip", params.strip.as_ref())
        .option_opt("--mutate", params.mutate.as_ref())
        .option_opt("-rn", params.residue_name.as_ref())
        .option_opt("--model", params.model);

    info!(
        "Prepared pdb4amber job with {} expected output(s).",
        manifest.outfiles().len()
    );

    Ok(JobPlan {
        tool: Tool::Pdb4amber,
        command_line,
        primary_inputs,
        manifest,
    })
}
