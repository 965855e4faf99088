use anyhow::Result as AnyResult;
use config::{Config, Environment as ConfigEnv, File as ConfigFile};
use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};
use std::{default::Default, path::PathBuf, time::Duration};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CACHE_FILE: &str = "ctl-audit.yml";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Upper bound on each vendor request, connection included.
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub fetch_timeout: Duration,

    /// Where the engine state and allow overrides live.
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

impl GlobalConfig {
    pub fn load_config() -> AnyResult<Self> {
        let cfg = Config::builder()
            .add_source(ConfigFile::with_name("/etc/ctl-audit/").required(false))
            .add_source(ConfigFile::with_name("config").required(false))
            .add_source(ConfigEnv::with_prefix("CTL_AUDIT").separator("."))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: default_fetch_timeout(),
            cache_file: default_cache_file(),
        }
    }
}

const fn default_fetch_timeout() -> Duration {
    DEFAULT_FETCH_TIMEOUT
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}
