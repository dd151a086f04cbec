use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub dav: DavConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    SingleUser,
    BasicAuth,
    TrustedHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub single_user: Option<SingleUserAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleUserAuthConfig {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Protocol limits advertised to clients and enforced on PUT.
///
/// The date bounds are kept in iCalendar UTC form because that is the shape
/// they are advertised in via PROPFIND; the precondition engine parses them
/// once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct DavConfig {
    /// Request body cap in bytes, enforced by Content-Length and the reader.
    pub max_resource_size: usize,
    pub min_date_time: String,
    pub max_date_time: String,
    /// Upper bound on RRULE COUNT accepted on PUT.
    pub max_instances: u32,
    pub max_attendees_per_instance: u32,
    /// Days a deletion tombstone is retained for incremental sync replies.
    pub tombstone_retention_days: u32,
}

impl Settings {
    /// Loads configuration from defaults, an optional `config.toml`, and
    /// environment variables. Environment variables take precedence.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("logging.level", "debug")?
            .set_default("auth.method", "single_user")?
            .set_default("auth.single_user.email", "user@localhost")?
            .set_default("dav.max_resource_size", 10 * 1024 * 1024)?
            .set_default("dav.min_date_time", "19000101T000000Z")?
            .set_default("dav.max_date_time", "21001231T235959Z")?
            .set_default("dav.max_instances", 1000)?
            .set_default("dav.max_attendees_per_instance", 100)?
            .set_default("dav.tombstone_retention_days", 90)?
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            max_resource_size: 10 * 1024 * 1024,
            min_date_time: "19000101T000000Z".to_string(),
            max_date_time: "21001231T235959Z".to_string(),
            max_instances: 1000,
            max_attendees_per_instance: 100,
            tombstone_retention_days: 90,
        }
    }
}

/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
