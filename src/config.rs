//! Application-level configuration shared by the room server and the terminal clients.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::sync::WritePolicy;

/// Default location on disk where the binaries look for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FAMILY_FEUD_CONFIG_PATH";
/// Environment variable overriding the room server URL used by the clients.
/// An empty value disables the remote replica.
const SERVER_URL_ENV: &str = "FEUD_SERVER_URL";
/// Environment variable overriding the clients' local storage directory.
const STORAGE_DIR_ENV: &str = "FEUD_STORAGE_DIR";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_ROOM_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_MAX_ROOMS: usize = 1000;
const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
const DEFAULT_STORAGE_DIR: &str = ".feud";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_QUESTION_BANK: &str = "data/questions.json";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration.
pub struct AppConfig {
    /// Room server settings.
    pub server: ServerConfig,
    /// Host and viewer settings.
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq)]
/// Settings of the room server binary.
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Directory holding `index.html`, `host.html` and `viewer.html`.
    pub static_dir: PathBuf,
    /// Rooms idle longer than this are dropped.
    pub room_ttl: Duration,
    /// Period of the expiry sweep.
    pub sweep_interval: Duration,
    /// Rooms held at once; further new rooms are refused.
    pub max_rooms: usize,
}

#[derive(Debug, Clone, PartialEq)]
/// Settings of the host and viewer binaries.
pub struct ClientConfig {
    /// Base URL of the room server; `None` keeps everything on this device.
    pub server_url: Option<String>,
    /// Directory backing the local key-value store.
    pub storage_dir: PathBuf,
    /// Viewer poll and connection-check period.
    pub poll_interval: Duration,
    /// How host writes reach the server.
    pub write_policy: WritePolicy,
    /// JSON file with the question bank.
    pub question_bank: PathBuf,
}

impl AppConfig {
    /// Load the configuration file, then apply environment overrides.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path()).with_overrides(|key| env::var(key).ok())
    }

    /// Load the configuration at `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Apply `PORT`/`SERVER_PORT`, [`SERVER_URL_ENV`] and [`STORAGE_DIR_ENV`]
    /// as returned by `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT").or_else(|| lookup("SERVER_PORT"));
        if let Some(raw) = port {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %raw, "ignoring invalid port override"),
            }
        }

        if let Some(url) = lookup(SERVER_URL_ENV) {
            let url = url.trim();
            self.client.server_url = (!url.is_empty()).then(|| url.to_string());
        }

        if let Some(dir) = lookup(STORAGE_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            self.client.storage_dir = PathBuf::from(dir);
        }

        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    server: RawServer,
    client: RawClient,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawServer {
    port: Option<u16>,
    static_dir: Option<PathBuf>,
    room_ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
    max_rooms: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawClient {
    /// `null` disables the remote replica; absent means the default URL.
    #[serde(deserialize_with = "present")]
    server_url: Option<Option<String>>,
    storage_dir: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    write_policy: Option<WritePolicy>,
    question_bank: Option<PathBuf>,
}

/// Distinguish an explicit `null` from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let RawConfig { server, client } = value;

        let server = ServerConfig {
            port: server.port.unwrap_or(DEFAULT_PORT),
            static_dir: server
                .static_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            room_ttl: server
                .room_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ROOM_TTL),
            sweep_interval: server
                .sweep_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
            max_rooms: server
                .max_rooms
                .filter(|max| *max > 0)
                .unwrap_or(DEFAULT_MAX_ROOMS),
        };

        let client = ClientConfig {
            server_url: client
                .server_url
                .unwrap_or_else(|| Some(DEFAULT_SERVER_URL.to_string()))
                .filter(|url| !url.trim().is_empty()),
            storage_dir: client
                .storage_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            poll_interval: client
                .poll_interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            write_policy: client.write_policy.unwrap_or_default(),
            question_bank: client
                .question_bank
                .unwrap_or_else(|| PathBuf::from(DEFAULT_QUESTION_BANK)),
        };

        Self { server, client }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
