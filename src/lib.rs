
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Batches records through the caller and out to the writers
pub mod pipeline;
/// Various utility functions that tend to be very generic
pub mod util;
/// Core per-sample state machine that turns an aligned query into variant rows
pub mod variant_caller;
/// All output writers
pub mod writers;
