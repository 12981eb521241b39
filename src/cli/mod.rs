pub(crate) mod args;
pub(crate) mod commands;

pub(crate) use args::{Cli, absolute};
pub(crate) use commands::{Commands, ConfigCommands, ExportFormat, RotateDirection, Target};
