use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logging;

const CONFIG_PATH: &str = "app.json";

/// 網站根目錄
pub const DEFAULT_BASE_URI: &str = "https://www.bonbast.com";
/// 網站只認得這組行動版 Chrome 的 user-agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0(Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36(KHTML,like Gecko) curlrome/68.0.3440.106 Mobile Safari/537.36";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub bonbast: Bonbast,
}

const BONBAST_BASE_URI: &str = "BONBAST_BASE_URI";
const BONBAST_USER_AGENT: &str = "BONBAST_USER_AGENT";
const BONBAST_ACCEPT_INVALID_CERTS: &str = "BONBAST_ACCEPT_INVALID_CERTS";
const BONBAST_TIMEOUT_SECS: &str = "BONBAST_TIMEOUT_SECS";
const BONBAST_CONNECT_TIMEOUT_SECS: &str = "BONBAST_CONNECT_TIMEOUT_SECS";
const BONBAST_USE_SYSTEM_PROXY: &str = "BONBAST_USE_SYSTEM_PROXY";

/// Connection settings for the rate site.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Bonbast {
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Skips certificate and host name verification. Off unless explicitly
    /// enabled; only meant for talking to the site with a broken chain.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Honour `HTTP_PROXY` / `HTTPS_PROXY` from the environment.
    #[serde(default = "default_use_system_proxy")]
    pub use_system_proxy: bool,
}

impl Default for Bonbast {
    fn default() -> Self {
        Bonbast {
            base_uri: default_base_uri(),
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            use_system_proxy: true,
        }
    }
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_use_system_proxy() -> bool {
    true
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| {
    App::get().unwrap_or_else(|why| {
        logging::error_console(format!(
            "I can't read the config context because {:?}",
            why
        ));
        App::default().override_with_env()
    })
});

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(base_uri) = env::var(BONBAST_BASE_URI) {
            if !base_uri.trim().is_empty() {
                self.bonbast.base_uri = base_uri.trim().to_string();
            }
        }

        if let Ok(user_agent) = env::var(BONBAST_USER_AGENT) {
            if !user_agent.trim().is_empty() {
                self.bonbast.user_agent = user_agent;
            }
        }

        if let Ok(flag) = env::var(BONBAST_ACCEPT_INVALID_CERTS) {
            self.bonbast.accept_invalid_certs = parse_flag(&flag);
        }

        if let Ok(secs) = env::var(BONBAST_TIMEOUT_SECS) {
            self.bonbast.timeout_secs = u64::from_str(secs.trim()).unwrap_or(DEFAULT_TIMEOUT_SECS);
        }

        if let Ok(secs) = env::var(BONBAST_CONNECT_TIMEOUT_SECS) {
            self.bonbast.connect_timeout_secs =
                u64::from_str(secs.trim()).unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        }

        if let Ok(flag) = env::var(BONBAST_USE_SYSTEM_PROXY) {
            self.bonbast.use_system_proxy = parse_flag(&flag);
        }

        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
