//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Where generated quiz sets are cached between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    S3,
}

/// Bootstrap administrator created at startup when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperuserConfig {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub access_token_expire_minutes: i64,
    pub default_question_count: usize,
    pub default_options_per_question: usize,
    pub quiz_cache: CacheBackend,
    pub quiz_cache_ttl: Duration,
    pub first_superuser: Option<SuperuserConfig>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let quiz_cache = match lookup("QUIZ_CACHE").as_deref() {
            None | Some("memory") => CacheBackend::Memory,
            Some("s3") => CacheBackend::S3,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "QUIZ_CACHE",
                    value: other.to_string(),
                })
            }
        };

        let first_superuser = match (
            lookup("FIRST_SUPERUSER"),
            lookup("FIRST_SUPERUSER_EMAIL"),
            lookup("FIRST_SUPERUSER_PASSWORD"),
        ) {
            (Some(user_name), Some(email), Some(password)) => Some(SuperuserConfig {
                user_name,
                email,
                password,
            }),
            _ => None,
        };

        let default_options_per_question =
            parse_or(&lookup, "DEFAULT_OPTIONS_PER_QUESTION", quiz_core::DEFAULT_OPTIONS_PER_QUESTION)?;
        if default_options_per_question < 2 {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_OPTIONS_PER_QUESTION",
                value: default_options_per_question.to_string(),
            });
        }

        let ttl_minutes: u64 = parse_or(&lookup, "QUIZ_CACHE_TTL_MINUTES", 60)?;
        let quiz_cache_ttl = ttl_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::Invalid {
                key: "QUIZ_CACHE_TTL_MINUTES",
                value: ttl_minutes.to_string(),
            })?;

        let access_token_expire_minutes: i64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 15)?;
        if !(1..=i64::from(i32::MAX)).contains(&access_token_expire_minutes) {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: access_token_expire_minutes.to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            access_token_expire_minutes,
            default_question_count: parse_or(&lookup, "DEFAULT_QUESTION_COUNT", 10)?,
            default_options_per_question,
            quiz_cache,
            quiz_cache_ttl,
            first_superuser,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/words")]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.access_token_expire_minutes, 15);
        assert_eq!(config.default_question_count, 10);
        assert_eq!(config.default_options_per_question, 4);
        assert_eq!(config.quiz_cache, CacheBackend::Memory);
        assert_eq!(config.quiz_cache_ttl, Duration::from_secs(3600));
        assert!(config.first_superuser.is_none());
    }

    #[test]
    fn test_cache_ttl_overflow() {
        let max = u64::MAX.to_string();
        let result = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("QUIZ_CACHE_TTL_MINUTES", max.as_str()),
        ]);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Invalid {
                key: "QUIZ_CACHE_TTL_MINUTES",
                value: max
            }
        );

        let config = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("QUIZ_CACHE_TTL_MINUTES", "5"),
        ])
        .unwrap();
        assert_eq!(config.quiz_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_token_expiry_bounds() {
        for value in ["0", "-5", "9223372036854775807"] {
            let result = load(&[
                ("DATABASE_URL", "postgres://x"),
                ("ACCESS_TOKEN_EXPIRE_MINUTES", value),
            ]);
            assert!(matches!(
                result,
                Err(ConfigError::Invalid {
                    key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_missing_database_url() {
        let result = load(&[]);
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_number() {
        let result = load(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }

    #[test]
    fn test_options_per_question_lower_bound() {
        let result = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("DEFAULT_OPTIONS_PER_QUESTION", "1"),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "DEFAULT_OPTIONS_PER_QUESTION",
                ..
            })
        ));
    }

    #[test]
    fn test_s3_cache_and_superuser() {
        let config = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("QUIZ_CACHE", "s3"),
            ("FIRST_SUPERUSER", "admin"),
            ("FIRST_SUPERUSER_EMAIL", "admin@example.com"),
            ("FIRST_SUPERUSER_PASSWORD", "changeme"),
        ])
        .unwrap();
        assert_eq!(config.quiz_cache, CacheBackend::S3);
        assert_eq!(config.first_superuser.unwrap().user_name, "admin");
    }

    #[test]
    fn test_unknown_cache_backend() {
        let result = load(&[("DATABASE_URL", "postgres://x"), ("QUIZ_CACHE", "redis")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "QUIZ_CACHE", .. })));
    }
}
