//! Configuration module - CLI address plus environment variable parsing

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// `host:port` the server listens on
    pub listen: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Max inbound messages per second per connection
    pub input_rate_limit: u32,
    /// Simulation tunables
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from the CLI address and environment variables
    pub fn load(listen: String) -> Result<Self, ConfigError> {
        validate_listen(&listen)?;

        let defaults = GameConfig::default();
        let tick_ms: u64 = env_or("TICK_MS", defaults.tick_interval.as_millis() as u64)?;

        Ok(Self {
            listen,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            input_rate_limit: env_or("INPUT_RATE_LIMIT", 120)?,
            game: GameConfig {
                tick_interval: Duration::from_millis(tick_ms.max(1)),
                max_health: env_or("MAX_HEALTH", defaults.max_health)?,
                hit_damage: env_or("HIT_DAMAGE", defaults.hit_damage)?,
                bullet_speed: env_or("BULLET_SPEED", defaults.bullet_speed)?,
                ..defaults
            },
        })
    }
}

/// Geometry and combat constants shared by server and client
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Server tick interval
    pub tick_interval: Duration,
    pub playfield_width: f32,
    pub playfield_height: f32,
    pub ship_width: f32,
    pub ship_height: f32,
    pub bullet_width: f32,
    pub bullet_height: f32,
    /// Bullet displacement per tick
    pub bullet_speed: f32,
    /// Distance from ship centre to the bullet spawn point
    pub fire_offset: f32,
    pub max_health: i32,
    /// Health lost per confirmed hit
    pub hit_damage: i32,
    /// Recent positions kept per ship for smoothing
    pub history_capacity: usize,
    /// Client translation per move intent
    pub move_step: f32,
    /// Client rotation per turn intent, degrees
    pub turn_step: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            playfield_width: 1000.0,
            playfield_height: 700.0,
            ship_width: 120.0,
            ship_height: 75.0,
            bullet_width: 10.0,
            bullet_height: 3.0,
            bullet_speed: 5.0,
            fire_offset: 60.0,
            max_health: 194,
            hit_damage: 10,
            history_capacity: 8,
            move_step: 5.0,
            turn_step: 5.0,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid address {0:?}, expected host:port")]
    InvalidAddress(String),
}

/// Accepts `host:port`; usable as a clap value parser
pub fn parse_listen(listen: &str) -> Result<String, ConfigError> {
    validate_listen(listen)?;
    Ok(listen.to_string())
}

fn validate_listen(listen: &str) -> Result<(), ConfigError> {
    match listen.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(ConfigError::InvalidAddress(listen.to_string())),
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}
