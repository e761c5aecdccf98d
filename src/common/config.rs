//! # Configuration Utilities
//!
//! Credentials and endpoint settings for the ordering service, plus the TOML
//! loader used by the command-line client.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

/// WSDL location of the Yemeksepeti messaging web service.
pub const DEFAULT_WSDL_URL: &str =
    "http://messaging.yemeksepeti.com/messagingwebservice/integration.asmx?WSDL";

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: ServiceConfig = load_config("config/restaurant.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Account and restaurant identity used on every call.
///
/// `username`/`password` authenticate the session; `catalog_name` and
/// `category_id` scope restaurant-specific calls to one branch. The service's
/// own camelCase spellings are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(alias = "catalogName")]
    pub catalog_name: String,
    #[serde(alias = "categoryId")]
    pub category_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        catalog_name: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            catalog_name: catalog_name.into(),
            category_id: category_id.into(),
        }
    }
}

/// Where the service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// WSDL URL; the SOAP endpoint is the same URL without its query string.
    #[serde(default = "default_wsdl_url")]
    pub wsdl_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            wsdl_url: default_wsdl_url(),
        }
    }
}

impl EndpointConfig {
    /// SOAP endpoint derived from the WSDL URL.
    pub fn endpoint(&self) -> &str {
        self.wsdl_url
            .split_once('?')
            .map_or(self.wsdl_url.as_str(), |(base, _)| base)
    }
}

fn default_wsdl_url() -> String {
    DEFAULT_WSDL_URL.to_string()
}

/// Complete client configuration.
///
/// # Example TOML
///
/// ```toml
/// [credentials]
/// username = "restaurant-user"
/// password = "secret"
/// catalog_name = "TR_ISTANBUL"
/// category_id = "9f1b2c3d-0000-4000-8000-000000000000"
///
/// [service]
/// wsdl_url = "http://messaging.yemeksepeti.com/messagingwebservice/integration.asmx?WSDL"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub credentials: Credentials,
    #[serde(default)]
    pub service: EndpointConfig,
}

impl ServiceConfig {
    /// Configuration pointing at the production service.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            service: EndpointConfig::default(),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }
}
