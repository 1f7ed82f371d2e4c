/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::entity::PlayerTuning;
use crate::domain::maze::Difficulty;
use crate::domain::pursuer::PursuerConfig;
use crate::domain::search::Strategy;
use crate::domain::visibility::SightPolicy;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub maze: MazeConfig,
    pub player: PlayerConfig,
    pub pursuers: PursuerSettings,
    pub timing: TimingConfig,
    pub general: GeneralConfig,
}

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    pub difficulty: Difficulty,
    /// World units per cell. Speeds and radii are in the same units.
    pub cell_size: f32,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub speed: f32,
    pub lives: u32,
    pub turn_tolerance: f32,
    pub death_frames: u32,
    pub death_frame_time: f32,
}

#[derive(Clone, Debug)]
pub struct PursuerSettings {
    pub count: usize,
    /// Cycled when there are more pursuers than entries.
    pub strategies: Vec<Strategy>,
    pub speed: f32,
    pub replan_interval: f32,
    pub stuck_threshold: f32,
    pub use_visibility: bool,
    pub sight_policy: SightPolicy,
    pub sight_range: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub countdown_secs: f32,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// Fixed seed for reproducible mazes and AI choices.
    pub seed: Option<u64>,
    pub log_file: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    maze: TomlMaze,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    pursuer: TomlPursuer,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default = "default_maze_width")]
    width: usize,
    #[serde(default = "default_maze_height")]
    height: usize,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_speed")]
    speed: f32,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_turn_tolerance")]
    turn_tolerance: f32,
    #[serde(default = "default_player_death_frames")]
    death_frames: u32,
    #[serde(default = "default_death_frame_time")]
    death_frame_time: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPursuer {
    #[serde(default = "default_pursuer_count")]
    count: usize,
    #[serde(default = "default_strategies")]
    strategies: Vec<Strategy>,
    #[serde(default = "default_pursuer_speed")]
    speed: f32,
    #[serde(default = "default_replan_interval")]
    replan_interval: f32,
    #[serde(default = "default_stuck_threshold")]
    stuck_threshold: f32,
    #[serde(default = "default_use_visibility")]
    use_visibility: bool,
    #[serde(default)]
    sight_policy: SightPolicy,
    #[serde(default)]
    sight_range: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_countdown")]
    countdown_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_maze_width() -> usize { 27 }
fn default_maze_height() -> usize { 29 }
fn default_cell_size() -> f32 { 25.0 }

fn default_player_speed() -> f32 { 180.0 }   // 3 units/frame at 60 fps
fn default_lives() -> u32 { 3 }
fn default_turn_tolerance() -> f32 { 6.0 }
fn default_player_death_frames() -> u32 { 12 }
fn default_death_frame_time() -> f32 { 0.25 }

fn default_pursuer_count() -> usize { 2 }
fn default_strategies() -> Vec<Strategy> { vec![Strategy::AStar, Strategy::GreedyBestFirst] }
fn default_pursuer_speed() -> f32 { 180.0 }
fn default_replan_interval() -> f32 { 1.0 }
fn default_stuck_threshold() -> f32 { 0.5 }
fn default_use_visibility() -> bool { true }

fn default_tick_rate() -> u64 { 16 }
fn default_countdown() -> f32 { 3.0 }

fn default_log_file() -> String { "mazechase.log".into() }

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze {
            width: default_maze_width(),
            height: default_maze_height(),
            difficulty: Difficulty::default(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            speed: default_player_speed(),
            lives: default_lives(),
            turn_tolerance: default_turn_tolerance(),
            death_frames: default_player_death_frames(),
            death_frame_time: default_death_frame_time(),
        }
    }
}

impl Default for TomlPursuer {
    fn default() -> Self {
        TomlPursuer {
            count: default_pursuer_count(),
            strategies: default_strategies(),
            speed: default_pursuer_speed(),
            replan_interval: default_replan_interval(),
            stuck_threshold: default_stuck_threshold(),
            use_visibility: default_use_visibility(),
            sight_policy: SightPolicy::default(),
            sight_range: None,
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            countdown_secs: default_countdown(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            seed: None,
            log_file: default_log_file(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            maze: MazeConfig {
                width: t.maze.width,
                height: t.maze.height,
                difficulty: t.maze.difficulty,
                cell_size: t.maze.cell_size,
            },
            player: PlayerConfig {
                speed: t.player.speed,
                lives: t.player.lives,
                turn_tolerance: t.player.turn_tolerance,
                death_frames: t.player.death_frames,
                death_frame_time: t.player.death_frame_time,
            },
            pursuers: PursuerSettings {
                count: t.pursuer.count,
                strategies: t.pursuer.strategies,
                speed: t.pursuer.speed,
                replan_interval: t.pursuer.replan_interval,
                stuck_threshold: t.pursuer.stuck_threshold,
                use_visibility: t.pursuer.use_visibility,
                sight_policy: t.pursuer.sight_policy,
                sight_range: t.pursuer.sight_range,
            },
            timing: TimingConfig {
                tick_rate_ms: t.timing.tick_rate_ms,
                countdown_secs: t.timing.countdown_secs,
            },
            general: GeneralConfig {
                seed: t.general.seed,
                log_file: PathBuf::from(t.general.log_file),
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

/// A config.toml that exists but could not be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("parse error in {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// A missing file or missing keys fall back to defaults; an unreadable
    /// or malformed file also falls back, and the error is handed back for
    /// the caller to report.
    pub fn load() -> (Self, Option<ConfigError>) {
        Self::load_from(&candidate_dirs())
    }

    pub fn load_from(search_dirs: &[PathBuf]) -> (Self, Option<ConfigError>) {
        match load_toml(search_dirs) {
            Ok(t) => (t.into(), None),
            Err(e) => (TomlConfig::default().into(), Some(e)),
        }
    }

    /// Parse a TOML document. Missing sections and keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Into::into)
    }

    /// Per-pursuer tuning. Strategies cycle over the configured list.
    pub fn pursuer_config(&self, index: usize) -> PursuerConfig {
        let p = &self.pursuers;
        let strategy = if p.strategies.is_empty() {
            Strategy::default()
        } else {
            p.strategies[index % p.strategies.len()]
        };
        PursuerConfig {
            strategy,
            use_visibility: p.use_visibility,
            sight_policy: p.sight_policy,
            sight_range: p.sight_range,
            replan_interval: p.replan_interval,
            stuck_threshold: p.stuck_threshold,
            speed: p.speed,
            radius: self.maze.cell_size / 2.0,
            cell_size: self.maze.cell_size,
            ..PursuerConfig::default()
        }
    }

    pub fn player_tuning(&self) -> PlayerTuning {
        PlayerTuning {
            speed: self.player.speed,
            radius: self.maze.cell_size / 2.0,
            cell_size: self.maze.cell_size,
            turn_tolerance: self.player.turn_tolerance,
            death_frames: self.player.death_frames,
            death_frame_time: self.player.death_frame_time,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> Result<TomlConfig, ConfigError> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return read_toml(&path);
        }
    }
    Ok(TomlConfig::default())
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str::<TomlConfig>(&text)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.maze.width, 27);
        assert_eq!(cfg.maze.height, 29);
        assert_eq!(cfg.maze.difficulty, Difficulty::Medium);
        assert_eq!(cfg.player.lives, 3);
        assert_eq!(cfg.pursuers.count, 2);
        assert_eq!(cfg.pursuers.speed, cfg.player.speed);
        assert_eq!(cfg.pursuers.replan_interval, 1.0);
        assert_eq!(cfg.pursuers.stuck_threshold, 0.5);
        assert!(cfg.pursuers.use_visibility);
        assert_eq!(cfg.general.seed, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [maze]
            width = 15
            difficulty = "hard"

            [pursuer]
            strategies = ["bfs", "dfs"]
            sight_policy = "bresenham"
            sight_range = 8

            [general]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.maze.width, 15);
        assert_eq!(cfg.maze.height, 29);
        assert_eq!(cfg.maze.difficulty, Difficulty::Hard);
        assert_eq!(cfg.pursuers.strategies, vec![Strategy::BreadthFirst, Strategy::DepthFirst]);
        assert_eq!(cfg.pursuers.sight_policy, SightPolicy::Bresenham);
        assert_eq!(cfg.pursuers.sight_range, Some(8));
        assert_eq!(cfg.general.seed, Some(7));
    }

    #[test]
    fn example_file_parses() {
        let cfg = GameConfig::from_toml_str(include_str!("../config.example.toml")).unwrap();
        assert_eq!(cfg.pursuers.strategies, vec![Strategy::AStar, Strategy::GreedyBestFirst]);
        assert_eq!(cfg.timing.tick_rate_ms, 16);
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        assert!(GameConfig::from_toml_str("[pursuer]\nstrategies = [\"teleport\"]").is_err());
    }

    #[test]
    fn pursuer_strategies_cycle() {
        let mut cfg = GameConfig::default();
        cfg.pursuers.strategies = vec![Strategy::BreadthFirst, Strategy::DepthFirst];
        assert_eq!(cfg.pursuer_config(0).strategy, Strategy::BreadthFirst);
        assert_eq!(cfg.pursuer_config(1).strategy, Strategy::DepthFirst);
        assert_eq!(cfg.pursuer_config(2).strategy, Strategy::BreadthFirst);

        cfg.pursuers.strategies.clear();
        assert_eq!(cfg.pursuer_config(3).strategy, Strategy::AStar);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mazechase-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn malformed_file_reports_error_and_uses_defaults() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("config.toml"), "[maze\nwidth = ").unwrap();

        let (cfg, err) = GameConfig::load_from(&[dir.clone()]);
        assert!(matches!(err, Some(ConfigError::Parse { .. })));
        assert!(err.unwrap().to_string().contains("config.toml"));
        assert_eq!(cfg.maze.width, 27);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_silent() {
        let dir = scratch_dir("missing");
        let (cfg, err) = GameConfig::load_from(&[dir.clone()]);
        assert!(err.is_none());
        assert_eq!(cfg.pursuers.count, 2);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn first_directory_with_a_file_wins() {
        let empty = scratch_dir("first-empty");
        let found = scratch_dir("first-found");
        std::fs::write(found.join("config.toml"), "[maze]\nwidth = 13\n").unwrap();

        let (cfg, err) = GameConfig::load_from(&[empty.clone(), found.clone()]);
        assert!(err.is_none());
        assert_eq!(cfg.maze.width, 13);

        std::fs::remove_dir_all(empty).unwrap();
        std::fs::remove_dir_all(found).unwrap();
    }

    #[test]
    fn tuning_scales_with_cell_size() {
        let mut cfg = GameConfig::default();
        cfg.maze.cell_size = 30.0;
        assert_eq!(cfg.player_tuning().radius, 15.0);
        assert_eq!(cfg.pursuer_config(0).cell_size, 30.0);
        assert_eq!(cfg.pursuer_config(0).radius, 15.0);
    }
}
