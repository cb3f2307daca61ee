//! # Core Models Module
//!
//! Plain data shared between the scanner, the resolver and job collaborators.
//!
//! - [`reference`] - File references extracted from scripts or command lines, and the
//!   ordered [`reference::ScannedScript`] lists the scanner produces
//! - [`declaration`] - The [`declaration::DeclarationSet`] manifest of staged inputs,
//!   directory bundles and expected outputs, generic over the collaborator's handle type

pub mod declaration;
pub mod reference;
