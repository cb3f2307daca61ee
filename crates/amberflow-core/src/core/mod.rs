//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! ## Overview
//!
//! Nothing in this module touches the filesystem beyond reading a script on request.
//! It turns script text into ordered file references and defines the shapes that the
//! engine fills in:
//!
//! - **Script Scanning** ([`script`]) - Comment stripping, per-dialect directive rules
//!   and the scanner that applies them line by line
//! - **Models** ([`models`]) - File references, scanned scripts and declaration sets
//! - **Utilities** ([`utils`]) - Link-label sanitization for staged files

pub mod models;
pub mod script;
pub mod utils;
