use super::current_dir;
use crate::cli::ScanArgs;
use crate::error::Result;
use amberflow::core::models::reference::{FileReference, ScannedScript};
use amberflow::core::script::directive::Dialect;
use amberflow::core::script::scanner::scan_file;
use amberflow::engine::resolver::{ArtifactManifest, ArtifactResolver};
use tracing::info;

pub async fn run(args: ScanArgs) -> Result<()> {
    let dialect = Dialect::from(args.dialect);
    let script = current_dir()?.join(&args.script);
    info!("Scanning {:?} as a {} script", &script, dialect);

    let scanned = scan_file(&script, dialect)?;
    print!("{}", describe_references(&scanned));

    if args.resolve {
        let base_dir = match script.parent() {
            Some(parent) => parent.to_path_buf(),
            None => current_dir()?,
        };
        let manifest = ArtifactResolver::new(base_dir).resolve(&scanned)?;
        print!("{}", describe_manifest(&manifest));
    }
    Ok(())
}

fn describe_references(scanned: &ScannedScript) -> String {
    let mut out = String::new();
    let sections: [(&str, &[FileReference]); 2] = [
        ("Inputs", &scanned.input_files),
        ("Outputs", &scanned.output_files),
    ];
    for (title, references) in sections {
        out.push_str(&format!("{} ({}):\n", title, references.len()));
        for reference in references {
            match reference.line {
                Some(line) => out.push_str(&format!("  {:>4}: {}\n", line, reference.path)),
                None => out.push_str(&format!("        {}\n", reference.path)),
            }
        }
    }
    out
}

fn describe_manifest(manifest: &ArtifactManifest) -> String {
    let mut out = String::from("Declarations:\n");
    for (label, path) in manifest.files() {
        out.push_str(&format!("  file   {:<20} {}\n", label, path.display()));
    }
    for (bundle, members) in manifest.dirs() {
        for (relative, path) in members {
            out.push_str(&format!(
                "  dir    {:<20} {}\n",
                format!("{}/{}", bundle, relative),
                path.display()
            ));
        }
    }
    for name in manifest.outfiles() {
        out.push_str(&format!("  output {}\n", name));
    }
    out
}
