use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local storage, lost on restart. Used for demos and tests.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default)]
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_root")]
    pub root: String,
    #[serde(default = "default_media_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_backend() -> StorageBackend {
    StorageBackend::Postgres
}

fn default_max_connections() -> u32 {
    10
}

fn default_cookie_name() -> String {
    "yatube_session".to_string()
}

fn default_expiry_hours() -> u64 {
    24 * 14
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_media_url_prefix() -> String {
    "/media".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "postgres://localhost/yatube")?
            .set_default("database.max_connections", 10)?
            .set_default("session.secret", "development-secret-change-in-production")?
            .set_default("session.cookie_name", "yatube_session")?
            .set_default("session.expiry_hours", 24 * 14)?
            .set_default("session.secure", false)?
            .set_default("media.root", "media")?
            .set_default("media.url_prefix", "/media")?
            .set_default("media.max_upload_bytes", 5 * 1024 * 1024)?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// In-memory configuration with a throwaway secret; media goes under `media_root`.
    pub fn for_tests(media_root: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: 0,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                url: String::new(),
                max_connections: 1,
            },
            session: SessionConfig {
                secret: "test-secret".to_string(),
                cookie_name: default_cookie_name(),
                expiry_hours: 1,
                secure: false,
            },
            media: MediaConfig {
                root: media_root.into(),
                url_prefix: default_media_url_prefix(),
                max_upload_bytes: default_max_upload_bytes(),
            },
        }
    }
}
