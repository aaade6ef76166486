//! Command-line surface: argument parsing and mode routing

pub mod args;
pub mod router;

pub use args::{Cli, SelectionMode};
pub use router::{execute, load_settings, Collaborators};

/// Log filter for a `-v` count
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,reqwest=debug", // -vvv shows everything including dependencies
    }
}
