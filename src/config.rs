use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the per-title feature matrix CSV
    #[serde(default = "default_features_csv")]
    pub features_csv: String,

    /// Path to the cleaned catalogue metadata CSV
    #[serde(default = "default_metadata_csv")]
    pub metadata_csv: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_features_csv() -> String {
    "data/processed/anime_features.csv".to_string()
}

fn default_metadata_csv() -> String {
    "data/processed/clean_anime.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
