//! Directive grammars, one rule per directive family.
//!
//! A rule has two parts: a cheap `applies` check that classifies a tokenized line, and
//! an `extract` step that pulls the paths out of it. `extract` returns `None` when the
//! line is too short for the rule's form, which the scanner reports as a malformed
//! directive instead of skipping the line.

use crate::core::models::reference::ReferenceKind;
use phf::{Set, phf_set};
use std::fmt;

static CPPTRAJ_INPUT_COMMANDS: Set<&'static str> = phf_set! {
    "parm", "trajin", "reference", "readdata", "ensemble", "loadcrd", "readinput",
};

static CPPTRAJ_OUTPUT_COMMANDS: Set<&'static str> = phf_set! {
    "trajout", "outtraj", "writedata", "write",
};

const LOAD_KEYWORD: &str = "load";
const SAVE_KEYWORD: &str = "save";
const SAVE_PARM_KEYWORD: &str = "saveamberparm";
const LOG_KEYWORD: &str = "logfile";
const OUT_KEYWORD: &str = "out";

/// The script language a set of rules understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Tleap,
    Cpptraj,
}

impl Dialect {
    pub fn rules(self) -> &'static [DirectiveRule] {
        match self {
            Dialect::Tleap => TLEAP_RULES,
            Dialect::Cpptraj => CPPTRAJ_RULES,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Tleap => write!(f, "tleap"),
            Dialect::Cpptraj => write!(f, "cpptraj"),
        }
    }
}

pub struct DirectiveRule {
    pub family: &'static str,
    pub kind: ReferenceKind,
    /// Form the rule expects, quoted in malformed-directive errors.
    pub usage: &'static str,
    applies: fn(&[&str]) -> bool,
    extract: fn(&[&str]) -> Option<Vec<String>>,
}

impl fmt::Debug for DirectiveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveRule")
            .field("family", &self.family)
            .field("kind", &self.kind)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

impl DirectiveRule {
    pub fn applies(&self, tokens: &[&str]) -> bool {
        !tokens.is_empty() && (self.applies)(tokens)
    }

    pub fn extract(&self, tokens: &[&str]) -> Option<Vec<String>> {
        (self.extract)(tokens)
    }
}

pub static TLEAP_RULES: &[DirectiveRule] = &[
    DirectiveRule {
        family: "load",
        kind: ReferenceKind::Input,
        usage: "load<Type> <path> | <name> = load<Type> <path>",
        applies: is_load_line,
        extract: load_paths,
    },
    DirectiveRule {
        family: "saveAmberParm",
        kind: ReferenceKind::Output,
        usage: "saveAmberParm <unit> <topology> <coordinates>",
        applies: |tokens| contains_keyword(tokens[0], SAVE_PARM_KEYWORD),
        extract: |tokens| {
            (tokens.len() >= 4).then(|| {
                tokens[tokens.len() - 2..]
                    .iter()
                    .map(|t| t.to_string())
                    .collect()
            })
        },
    },
    DirectiveRule {
        family: "save",
        kind: ReferenceKind::Output,
        usage: "save<Format> <unit> <path>",
        applies: |tokens| {
            contains_keyword(tokens[0], SAVE_KEYWORD)
                && !contains_keyword(tokens[0], SAVE_PARM_KEYWORD)
        },
        extract: |tokens| tokens.get(2).map(|t| vec![t.to_string()]),
    },
    DirectiveRule {
        family: "logFile",
        kind: ReferenceKind::Output,
        usage: "logFile <path>",
        applies: |tokens| contains_keyword(tokens[0], LOG_KEYWORD),
        extract: |tokens| (tokens.len() >= 2).then(|| vec![tokens[tokens.len() - 1].to_string()]),
    },
];

pub static CPPTRAJ_RULES: &[DirectiveRule] = &[
    DirectiveRule {
        family: "read",
        kind: ReferenceKind::Input,
        usage: "<parm|trajin|reference|readdata|...> <path>",
        applies: |tokens| CPPTRAJ_INPUT_COMMANDS.contains(tokens[0].to_ascii_lowercase().as_str()),
        extract: |tokens| tokens.get(1).map(|t| vec![t.to_string()]),
    },
    DirectiveRule {
        family: "write",
        kind: ReferenceKind::Output,
        usage: "<trajout|outtraj|writedata|write> <path>",
        applies: |tokens| CPPTRAJ_OUTPUT_COMMANDS.contains(tokens[0].to_ascii_lowercase().as_str()),
        extract: |tokens| tokens.get(1).map(|t| vec![t.to_string()]),
    },
    DirectiveRule {
        family: "out",
        kind: ReferenceKind::Output,
        usage: "<command> ... out <path>",
        applies: |tokens| tokens[1..].iter().any(|t| t.eq_ignore_ascii_case(OUT_KEYWORD)),
        extract: out_paths,
    },
];

fn contains_keyword(token: &str, keyword: &str) -> bool {
    token.to_ascii_lowercase().contains(keyword)
}

/// A load keyword only counts where tleap reads a command: the first token, the token
/// before the path in `name = loadX path`, or the last token of a bare `name = loadX`.
fn is_load_line(tokens: &[&str]) -> bool {
    contains_keyword(tokens[0], LOAD_KEYWORD)
        || (tokens.len() > 2 && contains_keyword(tokens[tokens.len() - 2], LOAD_KEYWORD))
        || is_bare_load_assignment(tokens)
}

fn is_bare_load_assignment(tokens: &[&str]) -> bool {
    tokens.len() > 2
        && tokens[1] == "="
        && tokens
            .last()
            .is_some_and(|t| contains_keyword(t, LOAD_KEYWORD))
}

/// Both load forms are checked on every line. A path found by both is recorded once.
fn load_paths(tokens: &[&str]) -> Option<Vec<String>> {
    let mut paths: Vec<String> = Vec::new();

    if tokens.len() > 2 && contains_keyword(tokens[tokens.len() - 2], LOAD_KEYWORD) {
        paths.push(tokens[tokens.len() - 1].to_string());
    }

    if contains_keyword(tokens[0], LOAD_KEYWORD) {
        let path = tokens.get(1)?;
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }

    // `x = loadPdb` names a load command with nothing to load.
    if paths.is_empty() && is_bare_load_assignment(tokens) {
        return None;
    }

    Some(paths)
}

fn out_paths(tokens: &[&str]) -> Option<Vec<String>> {
    tokens
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, t)| t.eq_ignore_ascii_case(OUT_KEYWORD))
        .map(|(i, _)| tokens.get(i + 1).map(|t| t.to_string()))
        .collect()
}
