use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use amberflow::engine::collaborator::Tool;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILENAME: &str = "config.toml";
const RUNS_DIRNAME: &str = "runs";

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PartialCodesConfig {
    tleap: Option<PathBuf>,
    cpptraj: Option<PathBuf>,
    pdb4amber: Option<PathBuf>,
}

impl PartialCodesConfig {
    fn get(&self, tool: Tool) -> Option<&PathBuf> {
        match tool {
            Tool::Tleap => self.tleap.as_ref(),
            Tool::Cpptraj => self.cpptraj.as_ref(),
            Tool::Pdb4amber => self.pdb4amber.as_ref(),
        }
    }

    fn slot(&mut self, tool: Tool) -> &mut Option<PathBuf> {
        match tool {
            Tool::Tleap => &mut self.tleap,
            Tool::Cpptraj => &mut self.cpptraj,
            Tool::Pdb4amber => &mut self.pdb4amber,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PartialRunConfig {
    #[serde(rename = "work-dir")]
    work_dir: Option<PathBuf>,
    #[serde(rename = "output-dir")]
    output_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    codes: Option<PartialCodesConfig>,
    run: Option<PartialRunConfig>,
}

/// Everything a subcommand needs to launch a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub executable: PathBuf,
    pub description: Option<String>,
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `explicit` when given; otherwise the platform config file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                info!("Using configuration file {:?}", &path);
                Self::from_file(&path)
            }
            _ => {
                debug!("No configuration file found, using defaults.");
                Ok(Self::default())
            }
        }
    }

    /// Applies CLI arguments on top of the file values: CLI > file > default.
    pub fn merge_with_cli(mut self, tool: Tool, args: &RunArgs) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let codes = self.codes.take().unwrap_or_default();
        let run = self.run.take().unwrap_or_default();

        let executable = match args.code.as_ref().or(codes.get(tool)) {
            Some(code) => resolve_code(code)?,
            None => locate_default_code(tool, args.dry_run)?,
        };

        let work_dir = match args.work_dir.clone().or(run.work_dir) {
            Some(dir) => dir,
            None => default_work_dir()?,
        };
        let output_dir = args
            .output_dir
            .clone()
            .or(run.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(RunConfig {
            executable,
            description: args.description.clone(),
            work_dir,
            output_dir,
            dry_run: args.dry_run,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = parser::parse_key_value(kv_pair)
                .map_err(|e| CliError::Config(e.to_string()))?;
            let value = PathBuf::from(value);

            match key {
                "codes.tleap" => *self.codes_mut().slot(Tool::Tleap) = Some(value),
                "codes.cpptraj" => *self.codes_mut().slot(Tool::Cpptraj) = Some(value),
                "codes.pdb4amber" => *self.codes_mut().slot(Tool::Pdb4amber) = Some(value),
                "run.work-dir" => {
                    self.run.get_or_insert_with(Default::default).work_dir = Some(value);
                }
                "run.output-dir" => {
                    self.run.get_or_insert_with(Default::default).output_dir = Some(value);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn codes_mut(&mut self) -> &mut PartialCodesConfig {
        self.codes.get_or_insert_with(Default::default)
    }
}

/// A bare name is looked up on `PATH`; anything with a separator is taken as a path.
fn resolve_code(code: &Path) -> Result<PathBuf> {
    if code.components().count() > 1 || code.is_absolute() {
        if !code.is_file() {
            return Err(CliError::Argument(format!(
                "Executable does not exist: {}",
                code.display()
            )));
        }
        return Ok(code.to_path_buf());
    }
    which::which(code).map_err(|e| {
        CliError::Argument(format!(
            "Could not find '{}' on PATH: {}",
            code.display(),
            e
        ))
    })
}

fn locate_default_code(tool: Tool, dry_run: bool) -> Result<PathBuf> {
    let name = tool.executable_name();
    match which::which(name) {
        Ok(path) => {
            debug!("Found {} at {:?}", tool, &path);
            Ok(path)
        }
        Err(_) if dry_run => {
            warn!("'{}' is not on PATH; showing the bare name for this dry run.", name);
            Ok(PathBuf::from(name))
        }
        Err(e) => Err(CliError::Config(format!(
            "Could not find '{}' on PATH ({}). Set `codes.{}` in the config file or pass --code.",
            name, e, name
        ))),
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "amberflow", "amberflow")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

fn default_work_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(RUNS_DIRNAME))
        .ok_or_else(|| {
            CliError::Config(
                "Could not determine the default work directory. Pass --work-dir.".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        dir: TempDir,
        tleap: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let tleap = dir.path().join("bin").join("tleap");
        fs::create_dir_all(tleap.parent().unwrap()).unwrap();
        fs::write(&tleap, "").unwrap();
        Fixture { dir, tleap }
    }

    fn write_config(fx: &Fixture, content: &str) -> PathBuf {
        let path = fx.dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut args = vec!["amberflow", "tleap", "-f", "tleap.in"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Tleap(args) => args.run,
            _ => panic!("Expected 'tleap' subcommand"),
        }
    }

    #[test]
    fn file_values_fill_in_missing_cli_values() {
        let fx = fixture();
        let path = write_config(
            &fx,
            &format!(
                r#"
        [codes]
        tleap = "{}"

        [run]
        work-dir = "/scratch/runs"
        output-dir = "results"
        "#,
                fx.tleap.display()
            ),
        );

        let config = PartialConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(Tool::Tleap, &run_args(&[]))
            .unwrap();

        assert_eq!(config.executable, fx.tleap);
        assert_eq!(config.work_dir, PathBuf::from("/scratch/runs"));
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert_eq!(config.description, None);
        assert!(!config.dry_run);
    }

    #[test]
    fn cli_values_override_file_values() {
        let fx = fixture();
        let path = write_config(
            &fx,
            r#"
        [codes]
        tleap = "/does/not/exist/tleap"

        [run]
        work-dir = "/scratch/runs"
        "#,
        );
        let code = fx.tleap.to_str().unwrap().to_string();
        let args = run_args(&[
            "--code",
            &code,
            "--work-dir",
            "/tmp/here",
            "--description",
            "solvated complex",
        ]);

        let config = PartialConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(Tool::Tleap, &args)
            .unwrap();

        assert_eq!(config.executable, fx.tleap);
        assert_eq!(config.work_dir, PathBuf::from("/tmp/here"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.description.as_deref(), Some("solvated complex"));
    }

    #[test]
    fn set_values_override_the_file() {
        let fx = fixture();
        let path = write_config(
            &fx,
            r#"
        [run]
        work-dir = "/scratch/runs"
        "#,
        );
        let code = format!("codes.tleap={}", fx.tleap.display());
        let args = run_args(&["-S", &code, "-S", "run.work-dir=/fast/runs"]);

        let config = PartialConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(Tool::Tleap, &args)
            .unwrap();

        assert_eq!(config.executable, fx.tleap);
        assert_eq!(config.work_dir, PathBuf::from("/fast/runs"));
    }

    #[test]
    fn unknown_set_key_is_rejected() {
        let args = run_args(&["-S", "codes.sander=/bin/sander"]);
        let result = PartialConfig::default().merge_with_cli(Tool::Tleap, &args);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("codes.sander")));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let fx = fixture();
        let path = write_config(
            &fx,
            r#"
        [run]
        scratch = "/tmp"
        "#,
        );
        assert!(matches!(
            PartialConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_explicit_executable_is_an_argument_error() {
        let fx = fixture();
        let missing = fx.dir.path().join("bin").join("cpptraj");
        let args = RunArgs {
            code: Some(missing),
            work_dir: Some(fx.dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(
            PartialConfig::default().merge_with_cli(Tool::Cpptraj, &args),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let fx = fixture();
        let missing = fx.dir.path().join("absent.toml");
        assert!(matches!(
            PartialConfig::load(Some(&missing)),
            Err(CliError::Io(_))
        ));
    }
}
