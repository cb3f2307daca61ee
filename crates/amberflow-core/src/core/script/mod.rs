//! Static extraction of file references from tool scripts.
//!
//! Scripts are never executed or evaluated. Each line is split at the `#` comment
//! marker, tokenized on whitespace, and checked against the directive rules of its
//! [`directive::Dialect`]. A rule either yields paths or, when the line is too short
//! for the rule, aborts the scan with [`scanner::ScanError::MalformedDirective`].

pub mod directive;
pub mod line;
pub mod scanner;
