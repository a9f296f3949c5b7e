use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::Verbosity;
use serde::Deserialize;

use crate::format::Glyphs;
use crate::signals::Signal;

const CONFIG_FILE: &str = concat!(env!("CARGO_PKG_NAME"), ".toml");

fn default_playerctl() -> PathBuf {
    PathBuf::from("playerctl")
}

fn default_format() -> String {
    String::from("{{title}}")
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Stream formatted titles with `metadata --follow`
    Title,
    /// Stream playback status and prefix the title with a status glyph
    #[default]
    Status,
}

impl Mode {
    pub fn default_signals(self) -> Vec<Signal> {
        match self {
            Mode::Title => vec![Signal::Int, Signal::Term],
            Mode::Status => vec![Signal::Int],
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(short, long, value_enum, help = "What to follow. Defaults to \"status\".")]
    mode: Option<Mode>,

    #[clap(short, long, help = "Only follow this playerctl player.")]
    player: Option<String>,

    #[clap(long, help = "playerctl executable. Defaults to \"playerctl\" from PATH.")]
    playerctl: Option<PathBuf>,

    #[clap(
        short,
        long,
        help = "playerctl metadata template for the title. Defaults to \"{{title}}\"."
    )]
    format: Option<String>,

    #[clap(
        short,
        long = "signal",
        value_enum,
        help = "Signal that stops the program, repeatable. Defaults to int (and term in title mode)."
    )]
    signals: Vec<Signal>,

    #[clap(long, help = "Emit an empty record before exiting.")]
    clear_on_exit: bool,

    #[clap(short, long, help = "Config file to read instead of the default one.")]
    config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

#[derive(Deserialize, Default, Debug)]
struct Toml {
    mode: Option<Mode>,
    player: Option<String>,
    playerctl: Option<PathBuf>,
    format: Option<String>,
    signals: Option<Vec<Signal>>,
    #[serde(default)]
    clear_on_exit: bool,
    #[serde(default)]
    glyphs: Glyphs,
}

impl Toml {
    pub fn new(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            return Self::load(path, true);
        }
        let Some(config_dir) = dirs::config_local_dir() else {
            warn!("Impossible to find config directory, using default config");
            return Toml::default();
        };
        Self::load(&config_dir.join(CONFIG_FILE), false)
    }

    fn load(file: &Path, explicit: bool) -> Self {
        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log!(
                    missing_file_level(explicit),
                    "No config at {}, using defaults",
                    file.display()
                );
                return Toml::default();
            }
            Err(e) => {
                warn!("Failed to read {}, using defaults: {e}", file.display());
                return Toml::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to parse config file {}, using defaults: {e}",
                    file.display()
                );
                Toml::default()
            }
        }
    }
}

/// Only a file the user asked for by path is worth a warning when it is absent.
fn missing_file_level(explicit: bool) -> log::Level {
    if explicit {
        log::Level::Warn
    } else {
        log::Level::Debug
    }
}

pub struct Config {
    pub mode: Mode,
    pub player: Option<String>,
    pub playerctl: PathBuf,
    pub format: String,
    pub signals: Vec<Signal>,
    pub clear_on_exit: bool,
    pub glyphs: Glyphs,
}

impl Config {
    pub fn new(cli: Cli) -> Self {
        let toml_data = Toml::new(cli.config.as_deref());
        Self::merge(cli, toml_data)
    }

    fn merge(cli: Cli, toml_data: Toml) -> Self {
        let mode = cli.mode.or(toml_data.mode).unwrap_or_default();
        let signals = if cli.signals.is_empty() {
            toml_data
                .signals
                .unwrap_or_else(|| mode.default_signals())
        } else {
            cli.signals
        };

        Config {
            mode,
            player: cli.player.or(toml_data.player),
            playerctl: cli
                .playerctl
                .or(toml_data.playerctl)
                .unwrap_or_else(default_playerctl),
            format: cli
                .format
                .or(toml_data.format)
                .unwrap_or_else(default_format),
            signals,
            clear_on_exit: cli.clear_on_exit || toml_data.clear_on_exit,
            glyphs: toml_data.glyphs,
        }
    }
}
