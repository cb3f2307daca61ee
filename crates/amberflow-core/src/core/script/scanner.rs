use super::directive::Dialect;
use super::line::script_lines;
use crate::core::models::reference::{FileReference, ScannedScript};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Malformed directive on line {line}: '{content}' (expected `{expected}`)")]
    MalformedDirective {
        line: usize,
        content: String,
        expected: &'static str,
    },
    #[error("Failed to read script '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Extracts the ordered input and output references of a script.
///
/// Every rule of the dialect is tried on every non-blank line, so one line can
/// contribute to both lists. The first line that is too short for a matching rule
/// aborts the scan.
pub fn scan(text: &str, dialect: Dialect) -> Result<ScannedScript, ScanError> {
    let rules = dialect.rules();
    let mut scanned = ScannedScript::new();

    for line in script_lines(text) {
        if line.is_blank() {
            continue;
        }
        let tokens = line.tokens();

        for rule in rules.iter().filter(|rule| rule.applies(&tokens)) {
            let paths = rule
                .extract(&tokens)
                .ok_or_else(|| ScanError::MalformedDirective {
                    line: line.number,
                    content: line.raw.trim().to_string(),
                    expected: rule.usage,
                })?;

            for path in paths {
                debug!(
                    "Line {}: {} directive '{}' references {} '{}'",
                    line.number, dialect, rule.family, rule.kind, path
                );
                scanned.push(FileReference {
                    path,
                    kind: rule.kind,
                    line: Some(line.number),
                });
            }
        }
    }

    trace!(
        "Scanned {} script: {} input(s), {} output(s)",
        dialect,
        scanned.input_files.len(),
        scanned.output_files.len()
    );
    Ok(scanned)
}

pub fn scan_tleap(text: &str) -> Result<ScannedScript, ScanError> {
    scan(text, Dialect::Tleap)
}

pub fn scan_file(path: &Path, dialect: Dialect) -> Result<ScannedScript, ScanError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    scan(&text, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(scanned: &ScannedScript) -> Vec<&str> {
        scanned.input_paths().collect()
    }

    fn outputs(scanned: &ScannedScript) -> Vec<&str> {
        scanned.output_paths().collect()
    }

    #[test]
    fn script_without_directives_scans_to_empty_lists() {
        let script = "source leaprc.protein.ff14SB\nsolvateBox mol TIP3PBOX 10\n\n# comment\nquit\n";
        let scanned = scan_tleap(script).unwrap();
        assert!(scanned.is_empty());
    }

    #[test]
    fn compound_load_params_line_yields_input() {
        let scanned = scan_tleap("a = loadAmberParams frcmod.file").unwrap();
        assert_eq!(inputs(&scanned), vec!["frcmod.file"]);
        assert!(scanned.output_files.is_empty());
    }

    #[test]
    fn compound_load_pdb_line_yields_input() {
        let scanned = scan_tleap("r1 = loadPdb complex.pdb").unwrap();
        assert_eq!(inputs(&scanned), vec!["complex.pdb"]);
    }

    #[test]
    fn save_amber_parm_yields_both_outputs_in_order() {
        let scanned = scan_tleap("saveAmberParm x complex.prmtop complex.inpcrd").unwrap();
        assert_eq!(outputs(&scanned), vec!["complex.prmtop", "complex.inpcrd"]);
    }

    #[test]
    fn trailing_comment_does_not_change_extraction() {
        let plain = scan_tleap("saveAmberParm x complex.prmtop complex.inpcrd").unwrap();
        let commented =
            scan_tleap("saveAmberParm x complex.prmtop complex.inpcrd  # final step").unwrap();
        assert_eq!(outputs(&plain), outputs(&commented));
    }

    #[test]
    fn log_file_directive_yields_output() {
        let scanned = scan_tleap("logFile run.log").unwrap();
        assert_eq!(outputs(&scanned), vec!["run.log"]);
    }

    #[test]
    fn other_save_directives_use_third_token() {
        let scanned = scan_tleap("savePdb mol solvated.pdb\nsaveOff mol ligand.lib").unwrap();
        assert_eq!(outputs(&scanned), vec!["solvated.pdb", "ligand.lib"]);
    }

    #[test]
    fn full_script_preserves_order_and_duplicates() {
        let script = "\
logFile leap.log
source leaprc.gaff
loadAmberParams lig.frcmod
LIG = loadMol2 lig.mol2
mol = loadPdb complex.pdb   # receptor + ligand
loadAmberParams lig.frcmod
saveAmberParm mol out/complex.prmtop out/complex.inpcrd
savePdb mol complex_dry.pdb
quit
";
        let scanned = scan_tleap(script).unwrap();
        assert_eq!(
            inputs(&scanned),
            vec!["lig.frcmod", "lig.mol2", "complex.pdb", "lig.frcmod"]
        );
        assert_eq!(
            outputs(&scanned),
            vec![
                "leap.log",
                "out/complex.prmtop",
                "out/complex.inpcrd",
                "complex_dry.pdb"
            ]
        );
        assert_eq!(scanned.input_files[2].line, Some(5));
    }

    #[test]
    fn file_names_containing_load_are_not_load_directives() {
        let scanned = scan_tleap("savePdb mol download.pdb").unwrap();
        assert!(scanned.input_files.is_empty());
        assert_eq!(outputs(&scanned), vec!["download.pdb"]);

        let scanned = scan_tleap("source leaprc.payload").unwrap();
        assert!(scanned.is_empty());
    }

    #[test]
    fn assignment_without_a_path_is_a_malformed_load() {
        let err = scan_tleap("mol = loadPdb").unwrap_err();
        assert!(matches!(err, ScanError::MalformedDirective { line: 1, .. }));
    }

    #[test]
    fn commented_out_directives_are_ignored() {
        let scanned = scan_tleap("# mol = loadPdb old.pdb\n#saveAmberParm x a b").unwrap();
        assert!(scanned.is_empty());
    }

    #[test]
    fn bare_load_is_a_malformed_directive_naming_the_line() {
        let err = scan_tleap("source leaprc.gaff\nload\n").unwrap_err();
        match err {
            ScanError::MalformedDirective { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "load");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_save_is_a_malformed_directive() {
        let err = scan_tleap("savePdb mol").unwrap_err();
        assert!(matches!(err, ScanError::MalformedDirective { line: 1, .. }));
        assert!(err.to_string().contains("savePdb mol"));
    }

    #[test]
    fn cpptraj_dialect_extracts_reads_writes_and_out_files() {
        let script = "\
parm complex.prmtop
trajin md.nc 1 last 10
reference ref.rst7
strip :WAT
rms first @CA out rmsd.dat
trajout stripped.nc netcdf
run
";
        let scanned = scan(script, Dialect::Cpptraj).unwrap();
        assert_eq!(
            inputs(&scanned),
            vec!["complex.prmtop", "md.nc", "ref.rst7"]
        );
        assert_eq!(outputs(&scanned), vec!["rmsd.dat", "stripped.nc"]);
    }

    #[test]
    fn scan_file_reports_unreadable_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_file(&dir.path().join("missing.in"), Dialect::Tleap).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }
}
