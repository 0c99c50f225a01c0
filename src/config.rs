//! Process configuration, read once from the environment after `dotenv`.

use std::net::SocketAddr;

use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use url::Url;

use crate::catalog::query::DEFAULT_PAGE_SIZE;
use crate::catalog::resolver::DEFAULT_METADATA_ENDPOINT;

const DEFAULT_BIND: &str = "0.0.0.0:3001";
const URL_PLACEHOLDER: &str = "your_database_url_here";
const KEY_PLACEHOLDER: &str = "your_database_key_here";

const DEFAULT_DEMO_EMAIL: &str = "admin@test.com";
const DEFAULT_DEMO_PASSWORD: &str = "password123";

/// Which store backs the catalog for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Remote,
    Fallback,
}

/// Endpoint and access key for the remote store.
#[derive(Clone, Debug)]
pub struct StoreCredentials {
    pub url: String,
    pub key: Secret<String>,
}

impl StoreCredentials {
    /// Both values present, not the template placeholders, and the URL is a
    /// postgres URL with a host.
    pub fn is_well_formed(&self) -> bool {
        let url = self.url.trim();
        let key = self.key.expose_secret().trim();

        if url.is_empty() || key.is_empty() || url == URL_PLACEHOLDER || key == KEY_PLACEHOLDER {
            return false;
        }

        match Url::parse(url) {
            Ok(parsed) => {
                matches!(parsed.scheme(), "postgres" | "postgresql")
                    && parsed.host_str().is_some_and(|h| !h.is_empty())
            }
            Err(_) => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DemoAdmin {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind: SocketAddr,
    pub store: Option<StoreCredentials>,
    pub metadata_endpoint: String,
    pub page_size: usize,
    pub jwt_secret: Secret<String>,
    pub demo_admin: DemoAdmin,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup("APP_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("APP_BIND is not a valid socket address")?;

        let store = match (lookup("CATALOG_DATABASE_URL"), lookup("CATALOG_DATABASE_KEY")) {
            (Some(url), Some(key)) => Some(StoreCredentials {
                url,
                key: Secret::new(key),
            }),
            _ => None,
        };

        let page_size = match lookup("CATALOG_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size >= 1)
                .with_context(|| format!("CATALOG_PAGE_SIZE must be a positive integer, got {raw:?}"))?,
            None => DEFAULT_PAGE_SIZE,
        };

        let jwt_secret = match lookup("SECRET_TOKEN") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("SECRET_TOKEN not set, tokens will not survive a restart");
                uuid::Uuid::new_v4().to_string()
            }
        };

        Ok(Settings {
            bind,
            store,
            metadata_endpoint: lookup("METADATA_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_METADATA_ENDPOINT.to_string()),
            page_size,
            jwt_secret: Secret::new(jwt_secret),
            demo_admin: DemoAdmin {
                email: lookup("DEMO_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_DEMO_EMAIL.to_string()),
                password: Secret::new(
                    lookup("DEMO_ADMIN_PASSWORD")
                        .unwrap_or_else(|| DEFAULT_DEMO_PASSWORD.to_string()),
                ),
            },
        })
    }

    /// Settings for an in-process instance with no remote store.
    pub fn fallback_defaults() -> Self {
        Settings {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            store: None,
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            jwt_secret: Secret::new(uuid::Uuid::new_v4().to_string()),
            demo_admin: DemoAdmin {
                email: DEFAULT_DEMO_EMAIL.to_string(),
                password: Secret::new(DEFAULT_DEMO_PASSWORD.to_string()),
            },
        }
    }

    pub fn store_mode(&self) -> StoreMode {
        match self.store_credentials() {
            Some(_) => StoreMode::Remote,
            None => StoreMode::Fallback,
        }
    }

    /// The remote store credentials, only when they are well-formed.
    pub fn store_credentials(&self) -> Option<&StoreCredentials> {
        self.store.as_ref().filter(|c| c.is_well_formed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    fn creds(url: &str, key: &str) -> StoreCredentials {
        StoreCredentials {
            url: url.into(),
            key: Secret::new(key.into()),
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind.to_string(), "0.0.0.0:3001");
        assert_eq!(s.page_size, 6);
        assert_eq!(s.metadata_endpoint, DEFAULT_METADATA_ENDPOINT);
        assert_eq!(s.demo_admin.email, "admin@test.com");
        assert_eq!(s.store_mode(), StoreMode::Fallback);
        assert!(!s.jwt_secret.expose_secret().is_empty());
    }

    #[test]
    fn well_formed_credentials_select_remote_mode() {
        let s = settings(&[
            ("CATALOG_DATABASE_URL", "postgres://db.internal:5432/catalog"),
            ("CATALOG_DATABASE_KEY", "s3cret"),
        ])
        .unwrap();
        assert_eq!(s.store_mode(), StoreMode::Remote);
    }

    #[test]
    fn malformed_credentials_fall_back() {
        assert!(!creds("your_database_url_here", "s3cret").is_well_formed());
        assert!(!creds("postgres://db/catalog", "your_database_key_here").is_well_formed());
        assert!(!creds("", "s3cret").is_well_formed());
        assert!(!creds("postgres://db/catalog", "  ").is_well_formed());
        assert!(!creds("https://db.example.com", "s3cret").is_well_formed());
        assert!(!creds("not a url", "s3cret").is_well_formed());
        assert!(creds("postgresql://user@db.example.com/app", "s3cret").is_well_formed());

        let only_url = settings(&[("CATALOG_DATABASE_URL", "postgres://db/catalog")]).unwrap();
        assert_eq!(only_url.store_mode(), StoreMode::Fallback);
    }

    #[test]
    fn invalid_page_size_is_rejected() {
        assert!(settings(&[("CATALOG_PAGE_SIZE", "0")]).is_err());
        assert!(settings(&[("CATALOG_PAGE_SIZE", "six")]).is_err());
        assert_eq!(settings(&[("CATALOG_PAGE_SIZE", "12")]).unwrap().page_size, 12);
    }

    #[test]
    fn invalid_bind_is_rejected() {
        assert!(settings(&[("APP_BIND", "localhost")]).is_err());
    }
}
