//! Hookwire Configuration Management
//!
//! Loads launcher and host settings from `hookwire.txt`.

use std::fs;
use std::io;
use std::path::Path;

use hookwire_core::{HookwireError, Result};

/// File read by [`HookwireConfig::load_default`]
pub const DEFAULT_CONFIG_FILE: &str = "hookwire.txt";

/// What to do when two plugins declare the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePlugins {
    /// Refuse to initialize
    #[default]
    Error,
    /// Keep the last one constructed
    Overwrite,
}

/// Complete launcher configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HookwireConfig {
    /// Length of the host player table (from "maxplayers", last slot reserved)
    pub max_players: usize,
    /// Length of the host NPC table (from "maxnpcs")
    pub max_npcs: usize,
    /// Length of the host projectile table (from "maxprojectiles")
    pub max_projectiles: usize,
    /// World width in tiles (from "worldwidth")
    pub world_width: usize,
    /// World height in tiles (from "worldheight")
    pub world_height: usize,
    /// Duplicate plugin policy (from "duplicateplugins")
    pub duplicate_plugins: DuplicatePlugins,
    /// Log filter level (from "loglevel")
    pub log_level: String,
    /// Capacity of each pooled send buffer (from "sendbuffersize")
    pub send_buffer_size: usize,
}

impl Default for HookwireConfig {
    fn default() -> Self {
        Self {
            max_players: 256,
            max_npcs: 201,
            max_projectiles: 1001,
            world_width: 4200,
            world_height: 1200,
            duplicate_plugins: DuplicatePlugins::Error,
            log_level: "info".into(),
            send_buffer_size: 65536,
        }
    }
}

impl HookwireConfig {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `hookwire.txt` from the working directory
    ///
    /// A missing file yields the defaults.
    pub fn load_default() -> Result<Self> {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Err(HookwireError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse `key = value` lines
    ///
    /// Blank lines and `#` comments are skipped. Unknown keys are ignored and
    /// unparsable values keep their default; a line without `=` is an error.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(HookwireError::Config(format!(
                    "line {}: expected key = value, got {:?}",
                    number + 1,
                    line
                )));
            };
            config.parse_option(&key.trim().to_lowercase(), value.trim());
        }

        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        let defaults = Self::default();
        match key {
            "maxplayers" => self.max_players = parse_table_len(value, defaults.max_players),
            "maxnpcs" => self.max_npcs = parse_table_len(value, defaults.max_npcs),
            "maxprojectiles" => self.max_projectiles = parse_table_len(value, defaults.max_projectiles),
            "worldwidth" => self.world_width = parse_world_len(value, defaults.world_width),
            "worldheight" => self.world_height = parse_world_len(value, defaults.world_height),
            "duplicateplugins" => {
                self.duplicate_plugins = match value.to_lowercase().as_str() {
                    "overwrite" => DuplicatePlugins::Overwrite,
                    _ => DuplicatePlugins::Error,
                };
            }
            "loglevel" => {
                let level = value.to_lowercase();
                self.log_level = match level.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" => level,
                    _ => defaults.log_level,
                };
            }
            "sendbuffersize" => {
                self.send_buffer_size = value
                    .parse()
                    .ok()
                    .filter(|size| *size >= 16)
                    .unwrap_or(defaults.send_buffer_size);
            }
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Hookwire configuration:");
        tracing::info!("  Max Players: {} ({} addressable)", self.max_players, self.max_players.saturating_sub(1));
        tracing::info!("  Max NPCs: {}", self.max_npcs);
        tracing::info!("  Max Projectiles: {}", self.max_projectiles);
        tracing::info!("  World Size: {}x{}", self.world_width, self.world_height);
        tracing::info!("  Duplicate Plugins: {:?}", self.duplicate_plugins);
        tracing::info!("  Log Level: {}", self.log_level);
        tracing::info!("  Send Buffer Size: {}", self.send_buffer_size);
    }
}

/// Table lengths include the reserved sentinel, so anything below two is unusable
fn parse_table_len(value: &str, default: usize) -> usize {
    value.parse().ok().filter(|len| *len >= 2).unwrap_or(default)
}

/// Tile coordinates travel as `i16`, which bounds a world side
fn parse_world_len(value: &str, default: usize) -> usize {
    value
        .parse()
        .ok()
        .filter(|len| (1..=i16::MAX as usize).contains(len))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HookwireConfig::default();
        assert_eq!(config.max_players, 256);
        assert_eq!(config.max_npcs, 201);
        assert_eq!(config.max_projectiles, 1001);
        assert_eq!((config.world_width, config.world_height), (4200, 1200));
        assert_eq!(config.duplicate_plugins, DuplicatePlugins::Error);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.send_buffer_size, 65536);
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# test server
maxplayers = 17
maxnpcs=51
worldwidth = 8400
duplicateplugins = Overwrite
loglevel = DEBUG
unknownkey = 5
"#;
        let config = HookwireConfig::parse(config_text).unwrap();
        assert_eq!(config.max_players, 17);
        assert_eq!(config.max_npcs, 51);
        assert_eq!(config.max_projectiles, 1001);
        assert_eq!((config.world_width, config.world_height), (8400, 1200));
        assert_eq!(config.duplicate_plugins, DuplicatePlugins::Overwrite);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_parse_bad_values_fall_back() {
        let config_text =
            "maxplayers = lots\nmaxnpcs = 1\nloglevel = loud\nsendbuffersize = 4\nworldheight = 0\nworldwidth = 40000\n";
        let config = HookwireConfig::parse(config_text).unwrap();
        assert_eq!(config, HookwireConfig::default());
    }

    #[test]
    fn test_parse_rejects_line_without_value() {
        let err = HookwireConfig::parse("maxplayers = 8\nmaxnpcs\n").unwrap_err();
        assert!(matches!(err, HookwireError::Config(ref message) if message.starts_with("line 2")));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "maxprojectiles = 11").unwrap();
        writeln!(file, "sendbuffersize = 1024").unwrap();

        let config = HookwireConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_projectiles, 11);
        assert_eq!(config.send_buffer_size, 1024);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HookwireConfig::load_from_file(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, HookwireError::Io(_)));
    }
}
