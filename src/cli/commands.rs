//! CLI subcommand definitions

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use crate::consts::DEFAULT_SHUFFLE_SEED;
use crate::core::Rotation;

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start a new session from an image directory
    Init {
        /// Directory searched recursively for images (defaults to the last one used)
        #[arg(short, long, value_name = "DIR")]
        images: Option<PathBuf>,
        /// Directory holding the reference images (defaults to the last one used)
        #[arg(short, long, value_name = "DIR")]
        reference: Option<PathBuf>,
        /// Filename delimiter separating the reference name, "__" unless
        /// remembered; an empty delimiter uses the file stem
        #[arg(long, allow_hyphen_values = true)]
        delimiter: Option<String>,
        /// Where to write the session JSON
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Keep images in sorted order
        #[arg(long)]
        no_shuffle: bool,
        /// Seed for the image order shuffle
        #[arg(long, default_value_t = DEFAULT_SHUFFLE_SEED)]
        seed: u64,
        /// Overwrite an existing session file
        #[arg(short, long)]
        force: bool,
    },
    /// Show session progress (default)
    Status,
    /// List the images of the session
    List {
        /// Only images not yet viewed
        #[arg(short, long)]
        pending: bool,
    },
    /// Show one image's annotations (current image by default)
    Show {
        /// Filename, or a 1-based position when no image has that name
        target: Option<String>,
    },
    /// Mark the current image and move to the next unrated one
    Next {
        /// Mark the current image as failed instead of rated
        #[arg(long)]
        failed: bool,
    },
    /// Mark the current image and move back one
    Prev,
    /// Mark the current image and jump to another
    Goto {
        /// Filename, or a 1-based position when no image has that name
        target: String,
    },
    /// Set a finding checkbox on the current image
    Check {
        finding: String,
        /// unchecked, uncertain, checked (or 0, 1, 2)
        state: String,
    },
    /// Select a rating label on the current image
    Rate {
        category: String,
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        label: Option<String>,
        /// Unset the rating
        #[arg(long)]
        clear: bool,
    },
    /// Replace the notes of the current image
    Note {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Rotate the current image by 90 degrees
    Rotate {
        #[arg(value_enum)]
        direction: RotateDirection,
    },
    /// Write the session file, optionally to a new path
    Save {
        /// Save to this file and continue the session there
        #[arg(long = "as", value_name = "FILE")]
        save_as: Option<PathBuf>,
    },
    /// Export the session
    Export {
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Write a backup now, regardless of the backup interval
    Backup,
    /// Check the session against the config and the image directory
    Validate,
    /// Rating distribution and finding counts
    Summary,
    /// Manage the annotation config
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Write a default config file
    Init {
        /// Target path (defaults to the application home)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the active config
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub(crate) enum RotateDirection {
    Left,
    Right,
}

impl From<RotateDirection> for Rotation {
    fn from(direction: RotateDirection) -> Self {
        match direction {
            RotateDirection::Left => Rotation::Left,
            RotateDirection::Right => Rotation::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Json,
    Csv,
}

/// An image addressed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Zero-based index
    Index(usize),
    File(String),
}

impl Target {
    /// Positive integers are 1-based positions, anything else is a filename
    pub(crate) fn parse(input: &str) -> Self {
        match input.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Target::Index(n - 1),
            _ => Target::File(input.to_string()),
        }
    }
}
