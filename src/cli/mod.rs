/*!
# CLI module
Command line interface functionality that is specific to refdiff.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The call CLI subcommand
pub mod call;
