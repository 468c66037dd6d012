pub mod args;
pub mod commands;

pub use args::{Cli, Commands, TrafficView};
pub use commands::run;
