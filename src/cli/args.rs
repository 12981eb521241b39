//! CLI argument definitions
//!
//! Global CLI options and settings merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::settings::Settings;

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "speedy-iqa")]
#[command(about = "Fast image quality assessment from the terminal", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Session JSON file (defaults to the last session used)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub(crate) session: Option<PathBuf>,

    /// Annotation config YAML (defaults to the last config used)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Only log errors to stderr
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,
}

impl Cli {
    /// Fill paths the user did not pass from persisted settings
    pub(crate) fn with_settings(mut self, settings: &Settings) -> Self {
        if self.session.is_none() {
            self.session = settings.json_path.clone();
        }
        if self.config.is_none() {
            self.config = settings.config_path.clone();
        }
        self
    }

    /// Make `--session` and `--config` absolute so they compare equal to the
    /// paths remembered in settings
    pub(crate) fn with_absolute_paths(mut self) -> Self {
        self.session = self.session.map(absolute);
        self.config = self.config.map(absolute);
        self
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}

pub(crate) fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_session_becomes_absolute() {
        let cli = Cli::parse_from(["speedy-iqa", "--session", "s.json"]).with_absolute_paths();
        let session = cli.session.unwrap();
        assert!(session.is_absolute());
        assert!(session.ends_with("s.json"));
    }

    #[test]
    fn explicit_paths_win_over_settings() {
        let settings = Settings {
            json_path: Some(PathBuf::from("/old/session.json")),
            config_path: Some(PathBuf::from("/old/config.yml")),
            ..Settings::default()
        };
        let cli = Cli::parse_from(["speedy-iqa", "--session", "new.json", "status"]);
        let cli = cli.with_settings(&settings);
        assert_eq!(cli.session, Some(PathBuf::from("new.json")));
        assert_eq!(cli.config, Some(PathBuf::from("/old/config.yml")));
    }

    #[test]
    fn no_color_overrides_always() {
        let cli = Cli::parse_from(["speedy-iqa", "--color", "always", "--no-color"]);
        assert!(!cli.use_color());
        let cli = Cli::parse_from(["speedy-iqa", "--color", "always"]);
        assert!(cli.use_color());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["speedy-iqa", "-v", "-q", "status"]).is_err());
    }
}
