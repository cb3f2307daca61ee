//! # amberflow Core Library
//!
//! Provenance-tracked job assembly for the Amber `tleap`, `cpptraj` and `pdb4amber`
//! command-line tools.
//!
//! ## Architectural Philosophy
//!
//! A sandboxed job only sees the files that were declared for it, and only the files
//! declared as outputs are captured afterwards. The library therefore works out the
//! complete input/output manifest of a tool invocation *before* anything runs, and
//! refuses to hand over an incomplete one.
//!
//! - **[`core`]: The Foundation.** Stateless pieces: the script scanner that statically
//!   extracts the files a `tleap` (or `cpptraj`) script reads and writes, the reference
//!   and declaration models, and link-label sanitization.
//!
//! - **[`engine`]: The Logic Core.** The artifact resolver that turns scanned references
//!   into an existence-checked manifest, the [`engine::collaborator::JobCollaborator`]
//!   seam towards a workflow engine, and a local sandbox implementation of it that
//!   stages files, runs the tool and records provenance.
//!
//! - **[`workflows`]: The Public API.** One module per tool: typed parameters, command
//!   line synthesis and the `prepare` → `stage` → `submit` → `retrieve` sequence.

pub mod core;
pub mod engine;
pub mod workflows;
