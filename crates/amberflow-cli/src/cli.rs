use amberflow::core::script::directive::Dialect;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The amberflow developers",
    version,
    about = "amberflow - Run AmberTools programs in isolated sandboxes with every input and output declared up front.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    /// Defaults to `config.toml` in the platform configuration directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the files a script reads and writes without running anything.
    Scan(ScanArgs),
    /// Build topologies and coordinates with tleap.
    Tleap(TleapArgs),
    /// Process trajectories with cpptraj.
    Cpptraj(CpptrajArgs),
    /// Prepare a PDB structure for tleap with pdb4amber.
    Pdb4amber(Pdb4amberArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectArg {
    Tleap,
    Cpptraj,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Tleap => Dialect::Tleap,
            DialectArg::Cpptraj => Dialect::Cpptraj,
        }
    }
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the script to scan.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Command language of the script.
    #[arg(long, value_enum, default_value_t = DialectArg::Tleap)]
    pub dialect: DialectArg,

    /// Also check that every input exists and show the resulting declarations.
    #[arg(long)]
    pub resolve: bool,
}

/// Options shared by every subcommand that runs a tool.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Executable to run, overriding the config file and `PATH` lookup.
    #[arg(long, value_name = "PATH")]
    pub code: Option<PathBuf>,

    /// Description recorded in the job's provenance file.
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Directory under which job sandboxes are created.
    #[arg(long, value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// Directory that retrieved outputs are copied into.
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Resolve inputs and print the job without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Set a configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S run.work-dir=/scratch/runs
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `tleap` subcommand.
#[derive(Args, Debug)]
pub struct TleapArgs {
    /// Path to the tleap script.
    #[arg(short = 'f', long = "script", value_name = "PATH")]
    pub script: PathBuf,

    /// Directory added to tleap's search path. Every file below it is staged.
    /// Can be used multiple times.
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments for the `cpptraj` subcommand.
#[derive(Args, Debug)]
pub struct CpptrajArgs {
    /// Input script. Defaults to `cpptraj.inp` when that file exists.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Topology file. Can be used multiple times.
    #[arg(short = 'p', long = "parm", value_name = "PATH")]
    pub topologies: Vec<String>,

    /// Input trajectory. Can be used multiple times.
    #[arg(short = 'y', long = "trajin", value_name = "PATH")]
    pub trajectories_in: Vec<String>,

    /// Reference coordinates. Can be used multiple times.
    #[arg(short = 'c', long = "reference", value_name = "PATH")]
    pub references: Vec<String>,

    /// Data file to read. Can be used multiple times.
    #[arg(short = 'd', long = "readdata", value_name = "PATH")]
    pub data_in: Vec<String>,

    /// Output trajectory. Can be used multiple times.
    #[arg(short = 'x', long = "trajout", value_name = "PATH")]
    pub trajectories_out: Vec<String>,

    /// Data file written at the end of the run.
    #[arg(short = 'w', long = "writedata", value_name = "PATH")]
    pub data_out: Option<String>,

    /// File receiving cpptraj's own output instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Log file for interactive commands.
    #[arg(long, value_name = "PATH")]
    pub log: Option<String>,

    /// Arguments for the matching input trajectory (`-ya`). Can be used multiple times.
    #[arg(long = "trajin-args", value_name = "ARGS")]
    pub trajectory_in_args: Vec<String>,

    /// Arguments for the matching output trajectory (`-xa`). Can be used multiple times.
    #[arg(long = "trajout-args", value_name = "ARGS")]
    pub trajectory_out_args: Vec<String>,

    /// Print the length of each input trajectory and exit (`-tl`).
    #[arg(long)]
    pub print_lengths: bool,

    /// Enter interactive mode after processing the script.
    #[arg(long)]
    pub interactive: bool,

    /// Print compiler defines and exit.
    #[arg(long)]
    pub defines: bool,

    /// Print cpptraj's version and exit (`-V`).
    #[arg(long)]
    pub tool_version: bool,

    /// Debug level passed to cpptraj.
    #[arg(long = "debug-level", value_name = "INT")]
    pub debug: Option<u32>,

    /// Print atom selection for a mask (`-ms`).
    #[arg(long, value_name = "MASK")]
    pub atom_mask: Option<String>,

    /// Print residue selection for a mask (`-mr`).
    #[arg(long, value_name = "MASK")]
    pub residue_mask: Option<String>,

    /// Print detailed atom selection for a mask (`-mask`).
    #[arg(long, value_name = "MASK")]
    pub mask: Option<String>,

    /// Print detailed residue selection for a mask.
    #[arg(long, value_name = "MASK")]
    pub resmask: Option<String>,

    /// Random number generator to use.
    #[arg(long, value_name = "NAME")]
    pub rng: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments for the `pdb4amber` subcommand.
#[derive(Args, Debug)]
pub struct Pdb4amberArgs {
    /// Input PDB file, or a PDB id together with `--pdbid`.
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output PDB file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Log file written by pdb4amber.
    #[arg(short = 'l', long, value_name = "PATH")]
    pub logfile: Option<String>,

    /// Write a tleap template script.
    #[arg(long, value_name = "PATH")]
    pub leap_template: Option<String>,

    /// Remove all hydrogen atoms.
    #[arg(long)]
    pub nohyd: bool,

    /// Remove all water molecules.
    #[arg(short, long)]
    pub dry: bool,

    /// Keep only protein residues.
    #[arg(long)]
    pub prot: bool,

    /// Keep only Amber-compatible residues.
    #[arg(long)]
    pub amber_compatible_residues: bool,

    /// Rename titratable residues for constant-pH simulations.
    #[arg(long)]
    pub constantph: bool,

    /// Keep the most populous alternate location for each atom.
    #[arg(long)]
    pub most_populous: bool,

    /// Keep all alternate locations.
    #[arg(long)]
    pub keep_altlocs: bool,

    /// Run reduce to add hydrogens.
    #[arg(long)]
    pub reduce: bool,

    /// Run reduce without its het dictionary.
    #[arg(long)]
    pub no_reduce_db: bool,

    /// Add missing heavy atoms.
    #[arg(long)]
    pub add_missing_atoms: bool,

    /// Do not write CONECT records.
    #[arg(long)]
    pub no_conect: bool,

    /// Do not write TER records.
    #[arg(long)]
    pub noter: bool,

    /// Atom mask of atoms to strip.
    #[arg(short, long, value_name = "MASK")]
    pub strip: Option<String>,

    /// Residues to mutate, e.g. `3-ALA,4-GLU`.
    #[arg(short, long, value_name = "LIST")]
    pub mutate: Option<String>,

    /// Residue name for a single-residue structure.
    #[arg(long, value_name = "NAME")]
    pub residue_name: Option<String>,

    /// Model to keep from a multi-model file. Negative keeps all models.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub model: Option<i32>,

    /// Treat the input as a PDB id to fetch instead of a local file.
    #[arg(long)]
    pub pdbid: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tleap_accepts_repeated_includes_and_run_options() {
        let cli = Cli::parse_from([
            "amberflow",
            "-vv",
            "tleap",
            "-f",
            "tleap.in",
            "-I",
            "leap",
            "-I",
            "lib",
            "--dry-run",
            "-S",
            "run.work-dir=/tmp/runs",
        ]);

        assert_eq!(cli.verbose, 2);
        let Commands::Tleap(args) = cli.command else {
            panic!("Expected 'tleap' subcommand");
        };
        assert_eq!(args.script, PathBuf::from("tleap.in"));
        assert_eq!(
            args.include_dirs,
            vec![PathBuf::from("leap"), PathBuf::from("lib")]
        );
        assert!(args.run.dry_run);
        assert_eq!(args.run.set_values, vec!["run.work-dir=/tmp/runs"]);
    }

    #[test]
    fn scan_defaults_to_the_tleap_dialect() {
        let cli = Cli::parse_from(["amberflow", "scan", "build.in"]);
        let Commands::Scan(args) = cli.command else {
            panic!("Expected 'scan' subcommand");
        };
        assert_eq!(args.dialect, DialectArg::Tleap);
        assert!(!args.resolve);
    }

    #[test]
    fn cpptraj_collects_repeated_file_options() {
        let cli = Cli::parse_from([
            "amberflow",
            "cpptraj",
            "-p",
            "a.prmtop",
            "-y",
            "md1.nc",
            "-y",
            "md2.nc",
            "--debug-level",
            "3",
            "--output-dir",
            "results",
        ]);
        let Commands::Cpptraj(args) = cli.command else {
            panic!("Expected 'cpptraj' subcommand");
        };
        assert_eq!(args.input, None);
        assert_eq!(args.trajectories_in, vec!["md1.nc", "md2.nc"]);
        assert_eq!(args.debug, Some(3));
        assert_eq!(args.run.output_dir, Some(PathBuf::from("results")));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["amberflow", "-q", "-v", "scan", "x.in"]);
        assert!(result.is_err());
    }
}
