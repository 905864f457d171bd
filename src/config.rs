//! Application configuration, read once at startup and passed into constructors.

use std::env;
use std::fmt;
use validator::Validate;

const DEFAULT_TOKEN_TTL: &str = "30d";
const DEFAULT_BCRYPT_COST: u32 = 12;
const DEFAULT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1";
const DEFAULT_API_URL: &str = "https://api.imagekit.io/v1";

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Token and password settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

/// Credentials and endpoints of the hosted image service.
#[derive(Debug, Clone)]
pub struct ImageKitConfig {
    pub private_key: String,
    pub upload_url: String,
    pub api_url: String,
}

/// Initial administrator created at startup when absent.
/// Held to the same rules as accounts created through the API.
#[derive(Debug, Clone, Validate)]
pub struct AdminSeed {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub auth: AuthConfig,
    pub imagekit: ImageKitConfig,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let server_port = parse(&lookup, "SERVER_PORT", 3000)?;
        let bcrypt_cost = parse(&lookup, "SALT_ROUNDS", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "SALT_ROUNDS",
                value: bcrypt_cost.to_string(),
            });
        }

        let raw_ttl = or_default("JWT_EXPIRES_IN", DEFAULT_TOKEN_TTL);
        let token_ttl = parse_duration(&raw_ttl).ok_or(ConfigError::Invalid {
            key: "JWT_EXPIRES_IN",
            value: raw_ttl,
        })?;

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                let seed = AdminSeed { email, password };
                if let Err(errors) = seed.validate() {
                    let fields = errors.field_errors();
                    return Err(if fields.contains_key("email") {
                        ConfigError::Invalid {
                            key: "ADMIN_EMAIL",
                            value: seed.email,
                        }
                    } else {
                        ConfigError::Invalid {
                            key: "ADMIN_PASSWORD",
                            value: "<hidden>".to_string(),
                        }
                    });
                }
                Some(seed)
            }
            _ => None,
        };

        Ok(Self {
            environment: or_default("APP_ENV", "development"),
            database_url: required("DATABASE_URL")?,
            server_port,
            server_host: or_default("SERVER_HOST", "127.0.0.1"),
            auth: AuthConfig {
                jwt_secret: required("JWT_SECRET")?,
                token_ttl,
                bcrypt_cost,
            },
            imagekit: ImageKitConfig {
                private_key: required("IMAGE_KIT_PRIVATE_KEY")?,
                upload_url: or_default("IMAGE_KIT_UPLOAD_URL", DEFAULT_UPLOAD_URL),
                api_url: or_default("IMAGE_KIT_API_URL", DEFAULT_API_URL),
            },
            admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Parses `90`, `90s`, `15m`, `12h` or `30d`.
pub fn parse_duration(raw: &str) -> Option<chrono::Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    match unit {
        "" | "s" => Some(chrono::Duration::seconds(amount)),
        "m" => Some(chrono::Duration::minutes(amount)),
        "h" => Some(chrono::Duration::hours(amount)),
        "d" => Some(chrono::Duration::days(amount)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://test"),
        ("JWT_SECRET", "secret"),
        ("IMAGE_KIT_PRIVATE_KEY", "private_test"),
    ];

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.environment, "development");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_url(), "http://127.0.0.1:3000");
        assert_eq!(config.auth.token_ttl, chrono::Duration::days(30));
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert_eq!(config.imagekit.upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(config.imagekit.api_url, DEFAULT_API_URL);
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_config_custom_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("APP_ENV", "production"),
            ("SERVER_PORT", "8080"),
            ("SERVER_HOST", "0.0.0.0"),
            ("JWT_EXPIRES_IN", "12h"),
            ("SALT_ROUNDS", "10"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "changeme"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.environment, "production");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.auth.token_ttl, chrono::Duration::hours(12));
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.admin.unwrap().email, "admin@example.com");
    }

    #[test]
    fn test_config_errors() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SERVER_PORT", "eighty"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err.to_string(), "SERVER_PORT has invalid value \"eighty\"");

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SALT_ROUNDS", "2"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_admin_seed_must_be_able_to_log_in() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("ADMIN_EMAIL", "admin@example.com"), ("ADMIN_PASSWORD", "admin")]);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "ADMIN_PASSWORD",
                value: "<hidden>".to_string()
            }
        );

        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("ADMIN_EMAIL", "admin"), ("ADMIN_PASSWORD", "changeme")]);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "ADMIN_EMAIL",
                value: "admin".to_string()
            }
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3600"), Some(chrono::Duration::hours(1)));
        assert_eq!(parse_duration("45s"), Some(chrono::Duration::seconds(45)));
        assert_eq!(parse_duration("15m"), Some(chrono::Duration::minutes(15)));
        assert_eq!(parse_duration("30d"), Some(chrono::Duration::days(30)));
        assert_eq!(parse_duration("2w"), None);
        assert_eq!(parse_duration("d"), None);
    }
}
