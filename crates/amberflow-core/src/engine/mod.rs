//! # Engine Module
//!
//! Turns scanned references into a complete, existence-checked job manifest and
//! hands it across the collaborator boundary.
//!
//! ## Overview
//!
//! - **Artifact Resolution** ([`resolver`]) - Classifies input references as plain files
//!   or directory-bundle members, checks that each exists, and strips outputs down to
//!   their file names. All checks finish before any file is staged.
//! - **Collaborator Seam** ([`collaborator`]) - The [`collaborator::JobCollaborator`]
//!   trait (`stage_file`, `submit`, `retrieve`) plus the request types that cross it.
//! - **Local Execution** ([`local`]) - A collaborator that runs tools in per-job
//!   sandbox directories and verifies their declared outputs.
//! - **Provenance** ([`provenance`]) - The TOML record written beside every local job.
//! - **Progress** ([`progress`]) - Callback-based progress events for front ends.
//! - **Errors** ([`error`]) - The [`error::EngineError`] taxonomy.

pub mod collaborator;
pub mod error;
pub mod local;
pub mod progress;
pub mod provenance;
pub mod resolver;
