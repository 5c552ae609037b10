use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "builderboard", about = "Leaderboard and analytics server for builder profiles")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub leaderboard: LeaderboardConfig,
    pub analytics: AnalyticsConfig,
    pub location: LocationConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the caller's user id, set by the upstream identity provider.
    pub user_header: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub newcomer_window_days: i64,
    pub featured_count: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub growth_window_days: i64,
    pub timeline_days: i64,
    pub daily_stats_days: i64,
    pub recent_stats_limit: u32,
    pub trending_window_days: i64,
    pub trending_limit: u32,
    pub top_countries: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LocationConfig {
    /// Radius, in degrees, of the disc stored coordinates are scattered in.
    pub jitter_degrees: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            newcomer_window_days: 7,
            featured_count: 3,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            growth_window_days: 15,
            timeline_days: 30,
            daily_stats_days: 14,
            recent_stats_limit: 30,
            trending_window_days: 7,
            trending_limit: 10,
            top_countries: 10,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            jitter_degrees: 0.05,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("builderboard.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".builderboard"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("builderboard.db"))
    }
}
