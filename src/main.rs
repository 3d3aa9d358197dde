//! Virustap: tap falling viruses whose values sum to 10 or 20 before they poison the river.

mod app;
mod audio;
mod effects;
mod game;
mod highscores;
mod input;
mod matching;
mod physics;
mod placement;
mod theme;
mod ui;
mod virus;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Driver-side options derived from the CLI (spawn cadence, frame rate, animation, sound).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub spawn_interval_ms: u64,
    pub frame_rate: f64,
    pub no_animation: bool,
    pub mute: bool,
}

/// Engine tunables. Distances are playfield units, speeds are units per ms, durations are ms.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub virus_size: f64,
    /// Spawn line, above the visible field.
    pub spawn_y: f64,
    /// Tokens above this line constrain spawn placement.
    pub near_top_y: f64,
    pub min_separation: f64,
    pub relaxed_separation: f64,
    pub placement_attempts: u32,
    pub relaxed_attempts: u32,
    pub edge_margin: f64,
    pub nudge_distance: f64,
    pub nudge_band: f64,
    pub base_fall_speed: f64,
    pub speed_growth: f64,
    pub base_quota: u32,
    pub quota_growth: f64,
    pub max_pollution: u32,
    pub score_per_token: u64,
    pub combo_bonus: f64,
    pub special_bonus: f64,
    pub special_chance: f64,
    pub effect_duration_ms: u64,
    pub slow_factor: f64,
    pub boost_factor: f64,
    pub lift_offset: f64,
    pub magnet_animation_ms: u64,
    pub explode_victims: usize,
    pub explode_points: u64,
    pub ghost_victims: usize,
    pub split_speed: f64,
    pub split_offset: f64,
    pub heal_amount: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            virus_size: 48.0,
            spawn_y: -50.0,
            near_top_y: 150.0,
            min_separation: 60.0,
            relaxed_separation: 40.0,
            placement_attempts: 50,
            relaxed_attempts: 20,
            edge_margin: 24.0,
            nudge_distance: 50.0,
            nudge_band: 100.0,
            base_fall_speed: 0.012,
            speed_growth: 1.15,
            base_quota: 50,
            quota_growth: 1.1,
            max_pollution: 5,
            score_per_token: 10,
            combo_bonus: 0.5,
            special_bonus: 1.2,
            special_chance: 0.05,
            effect_duration_ms: 3000,
            slow_factor: 0.5,
            boost_factor: 1.5,
            lift_offset: 96.0,
            magnet_animation_ms: 800,
            explode_victims: 4,
            explode_points: 10,
            ghost_victims: 3,
            split_speed: 0.8,
            split_offset: 30.0,
            heal_amount: 1,
        }
    }
}

impl EngineConfig {
    /// Defaults with the CLI overrides applied.
    pub fn from_args(args: &Args) -> Self {
        let mut config = Self::default();
        if let Some(max) = args.max_pollution {
            config.max_pollution = max.max(1);
        }
        if let Some(quota) = args.base_quota {
            config.base_quota = quota.max(1);
        }
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("theme not loaded, using defaults: {e}");
            theme::Theme::default()
        }
    };
    let config = GameConfig {
        spawn_interval_ms: args.spawn_interval_ms.max(1),
        frame_rate: args.frame_rate.clamp(1.0, 240.0),
        no_animation: args.no_animation,
        mute: args.mute,
    };
    let engine = EngineConfig::from_args(&args);
    let mut app = App::new(args, config, engine, theme)?;
    app.run()?;
    Ok(())
}

/// A TUI cannot log to the terminal it draws on, so logs only go to a file when asked.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-number puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "virustap",
    version,
    about = "Tap falling viruses whose values add up to 10 or 20 before they reach the river.",
    long_about = "Virustap is a terminal puzzle game.\n\n\
        Numbered viruses (1-9) drift down towards a river. Click viruses to select them; when the \
        selected values sum to exactly 10 or 20 they are destroyed and you score. Chains of \
        successful matches build a combo. Every virus that reaches the river pollutes it; five \
        pollutions and the game is over. Rare special viruses trigger effects when matched.\n\n\
        CONTROLS:\n  Click       Select / deselect a virus\n  \
        Enter/Space Start     P  Pause/Resume\n  \
        N           Next round (after a round is complete)\n  Esc / C     Clear selection\n  \
        R           Restart (after game over)    Q  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Seed for the random source. A fixed seed replays the same session for the same inputs.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Player name. The record is created on first use.
    #[arg(long, default_value = "player", value_name = "NAME")]
    pub name: String,

    /// Organization stored with a newly registered player.
    #[arg(long, default_value = "", value_name = "ORG")]
    pub organization: String,

    /// Milliseconds between spawns while a round is running.
    #[arg(long, default_value = "1500", value_name = "MS")]
    pub spawn_interval_ms: u64,

    /// Pollution count that ends the game.
    #[arg(long, value_name = "N")]
    pub max_pollution: Option<u32>,

    /// Spawn quota of the first round (grows 10% per round).
    #[arg(long, value_name = "N")]
    pub base_quota: Option<u32>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// No terminal bell on matches, drops and disturbances.
    #[arg(long)]
    pub mute: bool,

    /// Disable the disturbance animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE", value_parser = parse_frame_rate)]
    pub frame_rate: f64,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Directory for player and session records. Defaults to $XDG_CONFIG_HOME/virustap.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

fn parse_frame_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("frame rate must be a positive number, got {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_engine_defaults() {
        let args = Args::parse_from(["virustap", "--max-pollution", "3", "--base-quota", "0"]);
        let config = EngineConfig::from_args(&args);
        assert_eq!(config.max_pollution, 3);
        assert_eq!(config.base_quota, 1);
        assert_eq!(config.virus_size, 48.0);
    }

    #[test]
    fn frame_rate_rejects_non_finite() {
        for bad in ["NaN", "inf", "-5", "0"] {
            assert!(Args::try_parse_from(["virustap", "--frame-rate", bad]).is_err(), "{bad}");
        }
        let args = Args::parse_from(["virustap", "--frame-rate", "60"]);
        assert_eq!(args.frame_rate, 60.0);
    }

    #[test]
    fn palette_aliases_parse() {
        let args = Args::parse_from(["virustap", "--palette", "contrast"]);
        assert_eq!(args.palette, Palette::HighContrast);
        let args = Args::parse_from(["virustap", "--palette", "colourblind"]);
        assert_eq!(args.palette, Palette::Colorblind);
    }
}
