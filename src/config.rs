/*
 *  config.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::constants::*;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Stdin,
    Gpio,
}

/// Everything is optional so layers can be merged, see the accessors for defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,       // e.g., "info" | "debug"
    pub state_file: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub debounce_ms: Option<u64>,
    pub volume_step: Option<u8>,
    /// JSON calendar dump, no calendar panel when unset
    pub calendar_file: Option<PathBuf>,
    /// MET compact forecast, no weather panel when unset
    pub weather_file: Option<PathBuf>,
    pub calendar_lookahead_days: Option<u32>,
    pub calendar_cache_secs: Option<u64>,
    pub event_keyword: Option<String>,
    /// e.g. "mpg123 -q", cues are silent when unset
    pub cue_command: Option<String>,
    pub cue_dir: Option<PathBuf>,
    pub snapshot_file: Option<PathBuf>,
    pub input: Option<InputKind>,
    pub gpio_lines: Option<[u8; 4]>,
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    pub fn volume_step(&self) -> u8 {
        self.volume_step.unwrap_or(DEFAULT_VOLUME_STEP)
    }

    pub fn calendar_lookahead_days(&self) -> u32 {
        self.calendar_lookahead_days.unwrap_or(DEFAULT_CALENDAR_LOOKAHEAD_DAYS)
    }

    pub fn calendar_cache(&self) -> Duration {
        Duration::from_secs(self.calendar_cache_secs.unwrap_or(DEFAULT_CALENDAR_CACHE_SECS))
    }

    pub fn event_keyword(&self) -> &str {
        self.event_keyword.as_deref().unwrap_or(DEFAULT_EVENT_KEYWORD)
    }

    pub fn cue_dir(&self) -> PathBuf {
        self.cue_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn snapshot_file(&self) -> PathBuf {
        self.snapshot_file.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE))
    }

    pub fn input(&self) -> InputKind {
        self.input.unwrap_or_default()
    }

    pub fn gpio_lines(&self) -> [u8; 4] {
        self.gpio_lines.unwrap_or(DEFAULT_GPIO_LINES)
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "inkydash", version, about = "Household chores dashboard for an e-ink panel")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub state_file: Option<PathBuf>,
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,
    #[arg(long)]
    pub debounce_ms: Option<u64>,
    #[arg(long)]
    pub volume_step: Option<u8>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub calendar_file: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub weather_file: Option<PathBuf>,
    #[arg(long)]
    pub event_keyword: Option<String>,
    #[arg(long)]
    pub cue_command: Option<String>,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub cue_dir: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot_file: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub input: Option<InputKind>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    /// render a single cycle and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,
    /// mark every appliance idle since two days ago, then carry on
    #[arg(long, action = ArgAction::SetTrue)]
    pub reset_state: bool,
    /// record an appliance start by name and exit
    #[arg(long, value_name = "APPLIANCE")]
    pub mark: Option<String>,
}

/// Read YAML (explicit path or search), layer the CLI on top, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        merge(&mut cfg, read_yaml(p)?);
    } else if let Some(p) = find_config_file() {
        merge(&mut cfg, read_yaml(&p)?);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Pretty YAML of the effective config
pub fn dump_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/inkydash/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/inkydash/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/inkydash.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["inkydash.yaml", "config.yaml", "config/inkydash.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(&s)?)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    macro_rules! take {
        ($($field:ident),*) => {
            $( if src.$field.is_some() { dst.$field = src.$field; } )*
        };
    }
    take!(
        log_level, state_file, poll_interval_secs, debounce_ms, volume_step,
        calendar_file, weather_file, calendar_lookahead_days, calendar_cache_secs,
        event_keyword, cue_command, cue_dir, snapshot_file, input, gpio_lines
    );
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.debug                         { cfg.log_level = Some("debug".into()); }
    else if cli.log_level.is_some()      { cfg.log_level = cli.log_level.clone(); }
    if cli.state_file.is_some()          { cfg.state_file = cli.state_file.clone(); }
    if cli.poll_interval_secs.is_some()  { cfg.poll_interval_secs = cli.poll_interval_secs; }
    if cli.debounce_ms.is_some()         { cfg.debounce_ms = cli.debounce_ms; }
    if cli.volume_step.is_some()         { cfg.volume_step = cli.volume_step; }
    if cli.calendar_file.is_some()       { cfg.calendar_file = cli.calendar_file.clone(); }
    if cli.weather_file.is_some()        { cfg.weather_file = cli.weather_file.clone(); }
    if cli.event_keyword.is_some()       { cfg.event_keyword = cli.event_keyword.clone(); }
    if cli.cue_command.is_some()         { cfg.cue_command = cli.cue_command.clone(); }
    if cli.cue_dir.is_some()             { cfg.cue_dir = cli.cue_dir.clone(); }
    if cli.snapshot_file.is_some()       { cfg.snapshot_file = cli.snapshot_file.clone(); }
    if cli.input.is_some()               { cfg.input = cli.input; }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.poll_interval_secs == Some(0) {
        return Err(ConfigError::Validation("poll_interval_secs must be > 0".into()));
    }
    if let Some(step) = cfg.volume_step {
        if !(1..=100).contains(&step) {
            return Err(ConfigError::Validation("volume_step must be 1..=100".into()));
        }
    }
    if let Some(days) = cfg.calendar_lookahead_days {
        if !(1..=MAX_CALENDAR_LOOKAHEAD_DAYS).contains(&days) {
            return Err(ConfigError::Validation(format!(
                "calendar_lookahead_days must be 1..={}",
                MAX_CALENDAR_LOOKAHEAD_DAYS
            )));
        }
    }
    if let Some(level) = cfg.log_level.as_deref() {
        if level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Validation(format!("unknown log_level '{}'", level)));
        }
    }
    if cfg.event_keyword.as_deref().is_some_and(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation("event_keyword must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_any_layer() {
        let cfg = Config::default();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.debounce(), Duration::from_millis(100));
        assert_eq!(cfg.volume_step(), 10);
        assert_eq!(cfg.event_keyword(), "daniel");
        assert_eq!(cfg.input(), InputKind::Stdin);
        assert_eq!(cfg.gpio_lines(), [5, 6, 25, 24]);
        assert_eq!(cfg.state_file(), PathBuf::from("state.json"));
    }

    #[test]
    fn test_yaml_then_cli_precedence() {
        let yaml: Config = serde_yaml::from_str(
            "log_level: warn\npoll_interval_secs: 30\ninput: gpio\ngpio_lines: [17, 27, 22, 23]\n",
        )
        .unwrap();
        let mut cfg = Config::default();
        merge(&mut cfg, yaml);

        let cli = Cli { poll_interval_secs: Some(2), debug: true, ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli);

        assert_eq!(cfg.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.input(), InputKind::Gpio);
        assert_eq!(cfg.gpio_lines(), [17, 27, 22, 23]);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let bad = [
            Config { poll_interval_secs: Some(0), ..Default::default() },
            Config { volume_step: Some(0), ..Default::default() },
            Config { volume_step: Some(101), ..Default::default() },
            Config { calendar_lookahead_days: Some(0), ..Default::default() },
            Config { calendar_lookahead_days: Some(367), ..Default::default() },
            Config { calendar_lookahead_days: Some(4_000_000_000), ..Default::default() },
            Config { log_level: Some("loud".into()), ..Default::default() },
            Config { event_keyword: Some("  ".into()), ..Default::default() },
        ];
        for cfg in bad {
            assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))), "{:?}", cfg);
        }
        assert!(validate(&Config::default()).is_ok());
        assert!(validate(&Config { calendar_lookahead_days: Some(366), ..Default::default() }).is_ok());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/inkydash.yaml")), ..Default::default() };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_explicit_file_loads_and_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inkydash.yaml");
        fs::write(&path, "event_keyword: gran\ncalendar_cache_secs: 60\n").unwrap();

        let cli = Cli { config: Some(path), ..Default::default() };
        let cfg = load(&cli).unwrap();
        assert_eq!(cfg.event_keyword(), "gran");
        assert_eq!(cfg.calendar_cache(), Duration::from_secs(60));

        let dumped: Config = serde_yaml::from_str(&dump_config(&cfg).unwrap()).unwrap();
        assert_eq!(dumped, cfg);
    }
}
