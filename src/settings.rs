//! Game settings
//!
//! An immutable copy is handed to each session. Settings screens edit a
//! pending copy which takes effect at the next session reset.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load or store a JSON document
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Speed level to move delay mapping (geometric between the two ends)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedMapping {
    /// Slowest speed level
    pub min_speed: u32,
    /// Fastest speed level
    pub max_speed: u32,
    /// Move delay at `min_speed` (ms)
    pub slowest_delay_ms: f64,
    /// Move delay at `max_speed` (ms)
    pub fastest_delay_ms: f64,
}

impl Default for SpeedMapping {
    fn default() -> Self {
        Self {
            min_speed: 1,
            max_speed: 10,
            slowest_delay_ms: 300.0,
            fastest_delay_ms: 50.0,
        }
    }
}

impl SpeedMapping {
    /// Move delay in ms for a speed level (clamped to the mapping range)
    pub fn delay_ms(&self, speed: u32) -> f64 {
        let (start, end) = (self.min_speed, self.max_speed);
        if end <= start {
            return self.slowest_delay_ms;
        }
        let speed = speed.clamp(start, end);
        let ratio = self.fastest_delay_ms / self.slowest_delay_ms;
        let step = ratio.powf(1.0 / (end - start) as f64);
        self.slowest_delay_ms * step.powi((speed - start) as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field ===
    /// Field width in tiles
    pub field_width: i32,
    /// Field height in tiles
    pub field_height: i32,
    /// Leaving the field ends the run instead of wrapping
    pub walls: bool,

    // === Snake ===
    pub starting_length: i32,
    pub starting_speed: u32,
    pub speed_mapping: SpeedMapping,

    // === Scoring ===
    /// Chance that eating an apple spawns the bonus (0.0 - 1.0)
    pub bonus_chance: f64,
    pub apple_score: u64,
    pub bonus_score: u64,

    // === Loop ===
    /// Target loop iterations per second
    pub fps: u32,
    /// Intro screen duration (ms)
    pub intro_ms: f64,
    /// Fixed RNG seed (random per session when absent)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: 24,
            field_height: 18,
            walls: false,

            starting_length: 3,
            starting_speed: 5,
            speed_mapping: SpeedMapping::default(),

            bonus_chance: 0.2,
            apple_score: 10,
            bonus_score: 50,

            fps: 60,
            intro_ms: 2000.0,
            seed: None,
        }
    }
}

impl Settings {
    /// Move delay (ms) for the configured starting speed
    pub fn delay_ms(&self) -> f64 {
        self.speed_mapping.delay_ms(self.starting_speed)
    }

    /// Copy with every value forced into a playable range
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        s.field_width = s.field_width.clamp(4, 256);
        s.field_height = s.field_height.clamp(4, 256);
        s.starting_length = s.starting_length.clamp(1, s.field_width.min(s.field_height) / 2);
        if s.speed_mapping.max_speed < s.speed_mapping.min_speed {
            s.speed_mapping.max_speed = s.speed_mapping.min_speed;
        }
        s.starting_speed = s
            .starting_speed
            .clamp(s.speed_mapping.min_speed, s.speed_mapping.max_speed);
        if !(s.speed_mapping.slowest_delay_ms > 0.0) {
            s.speed_mapping.slowest_delay_ms = SpeedMapping::default().slowest_delay_ms;
        }
        if !(s.speed_mapping.fastest_delay_ms > 0.0) {
            s.speed_mapping.fastest_delay_ms = SpeedMapping::default().fastest_delay_ms;
        }
        s.bonus_chance = if s.bonus_chance.is_nan() { 0.0 } else { s.bonus_chance.clamp(0.0, 1.0) };
        s.fps = s.fps.clamp(1, 1000);
        s.intro_ms = s.intro_ms.max(0.0);
        s
    }

    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str::<Settings>(json)?.sanitized())
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| StorageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_mapping_ends() {
        let mapping = SpeedMapping::default();
        assert!((mapping.delay_ms(1) - 300.0).abs() < 1e-9);
        assert!((mapping.delay_ms(10) - 50.0).abs() < 1e-9);
        // Out-of-range levels clamp
        assert!((mapping.delay_ms(99) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_mapping_is_geometric() {
        let mapping = SpeedMapping::default();
        let r1 = mapping.delay_ms(3) / mapping.delay_ms(2);
        let r2 = mapping.delay_ms(8) / mapping.delay_ms(7);
        assert!((r1 - r2).abs() < 1e-9);
        assert!(r1 < 1.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "walls": true, "bonus_chance": 3.0 }"#).unwrap();
        assert!(settings.walls);
        assert_eq!(settings.bonus_chance, 1.0);
        assert_eq!(settings.field_width, Settings::default().field_width);
    }

    #[test]
    fn test_json_roundtrip_preserves_seed() {
        let settings = Settings {
            seed: Some(7),
            ..Default::default()
        };
        let back = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            Settings::from_json("{ nope"),
            Err(StorageError::Json(_))
        ));
    }
}
