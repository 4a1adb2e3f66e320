//! Engine configuration.
//!
//! - `Difficulty`: The three tiers a player can pick
//! - `DifficultyConfig`: Pair count, grid layout and time budget of one tier
//! - `EngineConfig`: Tiers plus the engine's fixed delays
//!
//! Every field has a default, so a JSON config only needs the values it
//! overrides:
//!
//! ```
//! use memory_match::core::{Difficulty, EngineConfig};
//!
//! let config = EngineConfig::from_json_str(r#"{ "resolve_delay_ms": 250 }"#).unwrap();
//! assert_eq!(config.resolve_delay_ms, 250);
//! assert_eq!(config.difficulty(Difficulty::Easy).pair_count, 3);
//! ```

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, EngineError};

/// Difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Key used by UIs and config files.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::UnknownDifficulty(s.to_string()))
    }
}

/// Static configuration of one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Number of distinct identities dealt (cards = 2 × pairs).
    pub pair_count: usize,

    /// Grid rows for rendering.
    pub rows: usize,

    /// Grid columns for rendering.
    pub columns: usize,

    /// Countdown budget in seconds.
    pub time_limit_secs: u32,
}

impl DifficultyConfig {
    /// Create a tier configuration.
    #[must_use]
    pub const fn new(pair_count: usize, rows: usize, columns: usize, time_limit_secs: u32) -> Self {
        Self {
            pair_count,
            rows,
            columns,
            time_limit_secs,
        }
    }

    /// Number of cards on the board.
    #[must_use]
    pub const fn card_count(&self) -> usize {
        self.pair_count * 2
    }

    fn validate(&self, difficulty: Difficulty) -> Result<(), ConfigError> {
        if self.pair_count == 0 {
            return Err(ConfigError::invalid(format!("{difficulty}: pair_count must be positive")));
        }
        if self.rows * self.columns != self.card_count() {
            return Err(ConfigError::invalid(format!(
                "{difficulty}: {}x{} grid cannot hold {} cards",
                self.rows,
                self.columns,
                self.card_count()
            )));
        }
        if self.time_limit_secs == 0 {
            return Err(ConfigError::invalid(format!("{difficulty}: time_limit_secs must be positive")));
        }
        Ok(())
    }
}

/// When the turn lock is released after a successful match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockPolicy {
    /// Unlock as soon as the pair is marked matched.
    #[default]
    Immediate,
    /// Unlock one resolve delay after the pair is marked matched.
    Delayed,
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub easy: DifficultyConfig,
    pub medium: DifficultyConfig,
    pub hard: DifficultyConfig,

    /// Delay between the second flip and resolution, and between a
    /// resolution and its visual follow-up (revert, unlock, win).
    pub resolve_delay_ms: u64,

    /// How long the power-up reveal lasts.
    pub powerup_duration_ms: u64,

    /// Countdown period.
    pub tick_interval_ms: u64,

    /// Lock release after a match that does not finish the board.
    pub match_unlock: UnlockPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            easy: DifficultyConfig::new(3, 2, 3, 120),
            medium: DifficultyConfig::new(6, 3, 4, 90),
            hard: DifficultyConfig::new(12, 4, 6, 60),
            resolve_delay_ms: 500,
            powerup_duration_ms: 3000,
            tick_interval_ms: 1000,
            match_unlock: UnlockPolicy::Immediate,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every tier and delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for difficulty in Difficulty::ALL {
            self.difficulty(difficulty).validate(difficulty)?;
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Tier configuration.
    #[must_use]
    pub fn difficulty(&self, difficulty: Difficulty) -> &DifficultyConfig {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Replace one tier's configuration.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty, tier: DifficultyConfig) -> Self {
        match difficulty {
            Difficulty::Easy => self.easy = tier,
            Difficulty::Medium => self.medium = tier,
            Difficulty::Hard => self.hard = tier,
        }
        self
    }

    /// Set the match unlock policy.
    #[must_use]
    pub fn with_match_unlock(mut self, policy: UnlockPolicy) -> Self {
        self.match_unlock = policy;
        self
    }

    #[must_use]
    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_delay_ms)
    }

    #[must_use]
    pub fn powerup_duration(&self) -> Duration {
        Duration::from_millis(self.powerup_duration_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.difficulty(Difficulty::Easy).card_count(), 6);
        assert_eq!(config.difficulty(Difficulty::Medium).card_count(), 12);
        assert_eq!(config.difficulty(Difficulty::Hard).card_count(), 24);
        assert_eq!(config.difficulty(Difficulty::Hard).time_limit_secs, 60);
        assert_eq!(config.resolve_delay(), Duration::from_millis(500));
        assert_eq!(config.powerup_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" Hard ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!(matches!(
            "expert".parse::<Difficulty>(),
            Err(EngineError::UnknownDifficulty(key)) if key == "expert"
        ));
        assert_eq!(Difficulty::Medium.to_string(), "medium");
    }

    #[test]
    fn test_json_overrides() {
        let json = r#"{
            "hard": { "pair_count": 8, "rows": 4, "columns": 4, "time_limit_secs": 45 },
            "match_unlock": "delayed"
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();

        assert_eq!(config.hard.pair_count, 8);
        assert_eq!(config.match_unlock, UnlockPolicy::Delayed);
        // Untouched fields keep their defaults
        assert_eq!(config.easy, EngineConfig::default().easy);
        assert_eq!(config.tick_interval_ms, 1000);
    }

    #[test]
    fn test_rejects_bad_grid() {
        let json = r#"{ "easy": { "pair_count": 3, "rows": 2, "columns": 2, "time_limit_secs": 60 } }"#;
        let err = EngineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("easy"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_with_difficulty() {
        let config = EngineConfig::default()
            .with_difficulty(Difficulty::Easy, DifficultyConfig::new(2, 2, 2, 30))
            .with_match_unlock(UnlockPolicy::Delayed);

        assert_eq!(config.easy.pair_count, 2);
        assert_eq!(config.match_unlock, UnlockPolicy::Delayed);
        assert!(config.validate().is_ok());
    }
}
