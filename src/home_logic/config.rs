use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Home-monitoring status bot", version)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    #[clap(long, env = "HOMEBOT_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "HOMEBOT_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "HOMEBOT_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "HOMEBOT_STATION_ENDPOINT", help = "Weather-station API endpoint URL.")]
    pub station_endpoint: Option<String>,

    #[clap(long, env = "HOMEBOT_STATION_TOKEN", help = "Weather-station API access token.")]
    pub station_token: Option<String>,

    #[clap(long, env = "HOMEBOT_STATION_DEVICE_ID", help = "Weather-station device id (optional).")]
    pub station_device_id: Option<String>,

    #[clap(long, env = "HOMEBOT_TV_HOST", help = "TV host name or address on the local network.")]
    pub tv_host: Option<String>,

    #[clap(long, env = "HOMEBOT_TV_PSK", help = "Pre-shared key for the TV control API.")]
    pub tv_psk: Option<String>,

    #[clap(long, env = "HOMEBOT_FEED_ENDPOINT", help = "Social feed base URL.")]
    pub feed_endpoint: Option<String>,

    #[clap(long, env = "HOMEBOT_FEED_TOKEN", help = "Social feed access token.")]
    pub feed_token: Option<String>,

    #[clap(long, env = "HOMEBOT_BEACON_PREFIX", help = "Device-name prefix of the light beacon.")]
    pub beacon_prefix: Option<String>,

    #[clap(long, env = "HOMEBOT_CAMERA_COMMAND", help = "Capture command; the output path is appended.")]
    pub camera_command: Option<String>,

    #[clap(long, env = "HOMEBOT_PHOTO_PATH", help = "Path the capture command writes the photo to.")]
    pub photo_path: Option<PathBuf>,

    #[clap(long, env = "HOMEBOT_WEATHER_POLL_SECONDS", help = "Weather poll cadence in seconds.")]
    pub weather_poll_seconds: Option<u64>,

    #[clap(long, env = "HOMEBOT_DISPLAY_POLL_SECONDS", help = "TV poll cadence in seconds.")]
    pub display_poll_seconds: Option<u64>,

    #[clap(long, env = "HOMEBOT_CAPTURE_COOLDOWN_SECONDS", help = "Cooldown between capture cycles in seconds.")]
    pub capture_cooldown_seconds: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            station_endpoint: other.station_endpoint.or(self.station_endpoint),
            station_token: other.station_token.or(self.station_token),
            station_device_id: other.station_device_id.or(self.station_device_id),
            tv_host: other.tv_host.or(self.tv_host),
            tv_psk: other.tv_psk.or(self.tv_psk),
            feed_endpoint: other.feed_endpoint.or(self.feed_endpoint),
            feed_token: other.feed_token.or(self.feed_token),
            beacon_prefix: other.beacon_prefix.or(self.beacon_prefix),
            camera_command: other.camera_command.or(self.camera_command),
            photo_path: other.photo_path.or(self.photo_path),
            weather_poll_seconds: other.weather_poll_seconds.or(self.weather_poll_seconds),
            display_poll_seconds: other.display_poll_seconds.or(self.display_poll_seconds),
            capture_cooldown_seconds: other.capture_cooldown_seconds.or(self.capture_cooldown_seconds),
        }
    }

    /// Resolves the layered config into concrete settings, failing on
    /// missing collaborator credentials.
    pub fn resolve(self) -> Result<Settings> {
        Ok(Settings {
            log_dir: self.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            station_endpoint: require(self.station_endpoint, "station_endpoint")?,
            station_token: require(self.station_token, "station_token")?,
            station_device_id: self.station_device_id,
            tv_host: require(self.tv_host, "tv_host")?,
            tv_psk: require(self.tv_psk, "tv_psk")?,
            feed_endpoint: require(self.feed_endpoint, "feed_endpoint")?,
            feed_token: require(self.feed_token, "feed_token")?,
            beacon_prefix: self.beacon_prefix.unwrap_or_else(|| "Lux".to_string()),
            camera_command: self
                .camera_command
                .unwrap_or_else(|| "raspistill -n -t 1000".to_string()),
            photo_path: self
                .photo_path
                .unwrap_or_else(|| PathBuf::from("/tmp/homebot/photo.jpg")),
            weather_poll_seconds: self.weather_poll_seconds.unwrap_or(300),
            display_poll_seconds: self.display_poll_seconds.unwrap_or(60),
            capture_cooldown_seconds: self.capture_cooldown_seconds.unwrap_or(900),
        })
    }
}

fn require(value: Option<String>, name: &str) -> Result<String> {
    value.with_context(|| format!("Missing required setting '{name}' (conf file, env or CLI)"))
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_dir: PathBuf,
    pub log_level: String,
    pub station_endpoint: String,
    pub station_token: String,
    pub station_device_id: Option<String>,
    pub tv_host: String,
    pub tv_psk: String,
    pub feed_endpoint: String,
    pub feed_token: String,
    pub beacon_prefix: String,
    pub camera_command: String,
    pub photo_path: PathBuf,
    pub weather_poll_seconds: u64,
    pub display_poll_seconds: u64,
    pub capture_cooldown_seconds: u64,
}

/// Layers the configuration: defaults, then the JSON conf file, then
/// environment variables and CLI arguments.
pub fn load_config() -> Config {
    let cli_args = Config::parse();

    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("homebot.conf"));

    let mut current_config = Config::default();

    if config_file_path.exists() {
        if let Ok(config_str) = fs::read_to_string(&config_file_path) {
            if let Ok(file_config) = serde_json::from_str::<Config>(&config_str) {
                current_config = current_config.merge(file_config);
            } else {
                log::warn!(
                    "Failed to parse config file: {}. Falling back to other sources.",
                    config_file_path.display()
                );
            }
        } else {
            log::warn!(
                "Failed to read config file: {}. Falling back to other sources.",
                config_file_path.display()
            );
        }
    } else {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            config_file_path.display()
        );
    }

    current_config.merge(cli_args)
}
