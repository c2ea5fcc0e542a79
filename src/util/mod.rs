
/// Helper functions for opening plain or gzipped inputs and outputs
pub mod file_io;
/// Helper functions for read/writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
