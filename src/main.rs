use std::io;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;

use crate::app::App;
use crate::breathing::BreathingCycle;
use crate::render::TerminalGuard;
use crate::theme::{Theme, ThemeContext, ThemeStore};
use crate::voice::VoiceGuidance;

mod app;
mod breathing;
mod effects;
mod render;
mod theme;
mod voice;

/// A terminal breathing and mindfulness companion.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Start with this theme instead of the saved one (cosmic, aurora,
    /// midnight, ember). The choice is persisted.
    #[arg(long, value_parser = parse_theme)]
    theme: Option<Theme>,

    /// Store the theme preference at this path instead of the platform
    /// configuration directory.
    #[arg(long, value_name = "PATH")]
    theme_file: Option<std::path::PathBuf>,

    /// Disable spoken phase cues even when a speech command is available.
    #[arg(long)]
    no_voice: bool,

    /// Frames per second for the render loop.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=120))]
    fps: u32,

    /// Jump straight into the breathing view.
    #[arg(long)]
    skip_intro: bool,
}

fn parse_theme(value: &str) -> Result<Theme, String> {
    Theme::from_str(value).map_err(|_| format!("unknown theme {value:?}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = match cli.theme_file {
        Some(path) => ThemeStore::at(path),
        None => ThemeStore::open(),
    };
    let mut theme = ThemeContext::load(store);
    let mut startup_warnings = Vec::new();
    if let Some(requested) = cli.theme {
        if let Err(error) = theme.set(requested) {
            startup_warnings.push(format!("theme not persisted: {error}"));
        }
    }

    let mut cycle = BreathingCycle::new();
    if !cli.no_voice {
        let voice = VoiceGuidance::new();
        if voice.available() {
            cycle.subscribe(Box::new(voice));
        }
    }

    let mut app = App::new(cycle, theme, cli.fps, cli.skip_intro);
    let mut out = io::stdout();
    let guard = TerminalGuard::enter(&mut out).context("failed to set up the terminal")?;
    let result = app.run(&mut out);
    drop(guard);

    // Warnings only make sense on the normal screen.
    for warning in startup_warnings.iter().chain(app.warnings()) {
        eprintln!("[serenim] {warning}");
    }
    result
}
