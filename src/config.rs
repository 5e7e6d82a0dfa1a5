use serde::Deserialize;

use crate::db::Credentials;

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // Database credentials, the only required settings
    pub db_username: String,
    pub db_password: String,

    #[serde(default = "default_mongo_scheme")]
    pub mongo_scheme: String,
    #[serde(default = "default_mongo_host")]
    pub mongo_host: String,
    #[serde(default = "default_mongo_database")]
    pub mongo_database: String,
    #[serde(default = "default_mongo_app_name")]
    pub mongo_app_name: String,

    // Unset means uploads are not size-limited
    pub max_request_body_mb: Option<u64>,

    #[serde(default = "default_public_ip_url")]
    pub public_ip_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_mongo_scheme() -> String {
    "mongodb+srv".to_string()
}

fn default_mongo_host() -> String {
    "cluster0.znflm.mongodb.net".to_string()
}

fn default_mongo_database() -> String {
    "multimedia_db".to_string()
}

fn default_mongo_app_name() -> String {
    "Cluster0".to_string()
}

fn default_public_ip_url() -> String {
    "https://api.ipify.org".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Connection string without credentials; those travel in the client options.
    pub fn mongo_uri(&self) -> String {
        format!(
            "{}://{}/?retryWrites=true&w=majority&appName={}",
            self.mongo_scheme, self.mongo_host, self.mongo_app_name
        )
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.db_username, &self.db_password)
    }

    pub fn max_request_body_bytes(&self) -> Option<usize> {
        self.max_request_body_mb.map(|mb| {
            usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_username", &self.db_username)
            .field("db_password", &"<redacted>")
            .field("mongo_scheme", &self.mongo_scheme)
            .field("mongo_host", &self.mongo_host)
            .field("mongo_database", &self.mongo_database)
            .field("mongo_app_name", &self.mongo_app_name)
            .field("max_request_body_mb", &self.max_request_body_mb)
            .field("public_ip_url", &self.public_ip_url)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    envy::from_iter([
        ("DB_USERNAME".to_string(), "tester".to_string()),
        ("DB_PASSWORD".to_string(), "secret".to_string()),
        ("MONGO_SCHEME".to_string(), "mongodb".to_string()),
        ("MONGO_HOST".to_string(), "localhost:27017".to_string()),
    ])
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_everything_but_credentials() {
        let config: Config = envy::from_iter([
            ("DB_USERNAME".to_string(), "darren".to_string()),
            ("DB_PASSWORD".to_string(), "hunter2".to_string()),
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.mongo_database, "multimedia_db");
        assert!(config.max_request_body_bytes().is_none());
        assert_eq!(
            config.mongo_uri(),
            "mongodb+srv://cluster0.znflm.mongodb.net/?retryWrites=true&w=majority&appName=Cluster0"
        );
        assert_eq!(config.credentials().username(), "darren");
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let result: Result<Config, _> = envy::from_iter([("PORT".to_string(), "9000".to_string())]);
        assert!(result.is_err());
    }

    #[test]
    fn test_body_limit_in_megabytes() {
        let mut config = test_config();
        config.max_request_body_mb = Some(16);
        assert_eq!(config.max_request_body_bytes(), Some(16 * 1024 * 1024));
    }

    #[test]
    fn test_huge_body_limit_saturates() {
        let mut config = test_config();
        config.max_request_body_mb = Some(u64::MAX);
        assert_eq!(config.max_request_body_bytes(), Some(usize::MAX));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = test_config();
        let printed = format!("{:?}", config);
        assert!(printed.contains("tester"));
        assert!(!printed.contains("secret"));
    }
}
