use anyhow::Context;
use profilemap_lib::{DEFAULT_STORAGE_KEY, MAP_REVEAL_DELAY};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};

pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub map_delay: Duration,
}

impl Config {
    /// Command-line values win; otherwise fall back to the environment, then defaults.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        storage_key: Option<String>,
        map_delay_ms: Option<u64>,
    ) -> anyhow::Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => try_load("PROFILEMAP_DATA_DIR", "data/profilemap.db")?,
        };
        let storage_key = match storage_key {
            Some(key) => key,
            None => try_load("PROFILEMAP_STORAGE_KEY", DEFAULT_STORAGE_KEY)?,
        };
        let map_delay_ms = match map_delay_ms {
            Some(ms) => ms,
            None => try_load(
                "PROFILEMAP_MAP_DELAY_MS",
                &MAP_REVEAL_DELAY.as_millis().to_string(),
            )?,
        };

        Ok(Self {
            data_dir,
            storage_key,
            map_delay: Duration::from_millis(map_delay_ms),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("{e}")
        })
        .with_context(|| format!("{key} is misconfigured"))
}
