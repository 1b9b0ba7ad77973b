//! Configuration management for the webindex server
//!
//! All configuration is loaded once at startup and handed to the request
//! handlers as read-only data; nothing here is mutated after `load()`.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Complete server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the HTTP listener
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted upload body size in MB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    /// Browsing endpoints, each mapping a route prefix to a directory tree
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// One browsing endpoint: a route prefix bound to a directory root with its
/// own access rules and preview mode.
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Route prefix, e.g. `/files`
    pub route: String,

    /// Directory tree exposed under the route
    pub root: String,

    /// ACL consulted for listing and download requests
    #[serde(default = "AclRule::default_view")]
    pub view: AclRule,

    /// ACL consulted for archive uploads
    #[serde(default = "AclRule::default_upload")]
    pub upload: AclRule,

    /// Optional HTTP Basic credentials; absent means no authentication
    #[serde(default)]
    pub auth: Option<AuthRule>,

    /// Inline preview mode for notable files in directory listings
    #[serde(default)]
    pub preview: PreviewMode,
}

/// Access rule evaluated against a client's network address.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AclRule {
    /// Every client address is allowed
    All,
    /// No client address is allowed
    None,
    /// Only loopback clients are allowed
    Local,
    /// Only the listed addresses are allowed
    Addrs(Vec<IpAddr>),
}

impl AclRule {
    fn default_view() -> Self {
        AclRule::All
    }

    fn default_upload() -> Self {
        AclRule::Local
    }
}

/// HTTP Basic authentication rule for an endpoint.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthRule {
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserCredential {
    pub name: String,
    pub password: String,
}

/// Inline preview behavior for directory listings.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    None,
    Inline,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_mb() -> u64 {
    100
}

impl ServerConfig {
    /// Load configuration from config.toml (if present) with environment
    /// overrides under the `WEBINDEX` prefix.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("WEBINDEX").separator("__"))
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        if config.endpoints.is_empty() {
            config.endpoints.push(EndpointConfig {
                route: "/files".to_string(),
                root: "./browse_root".to_string(),
                view: AclRule::default_view(),
                upload: AclRule::default_upload(),
                auth: None,
                preview: PreviewMode::None,
            });
        }
        config.validate()?;
        Ok(config)
    }

    /// Get bind address and port as a socket address string.
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get maximum upload body size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize) * 1024 * 1024
    }

    /// Validation for all configuration values.
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bind_address.is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.max_upload_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        Ok(())
    }
}

impl EndpointConfig {
    /// Get the browsing root as a PathBuf.
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    /// Display name used in authentication challenges for the endpoint root.
    pub fn display_name(&self) -> &str {
        self.route.trim_start_matches('/')
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if !self.route.starts_with('/') || self.route.len() < 2 || self.route.ends_with('/') {
            return Err(config::ConfigError::Message(format!(
                "endpoint route {:?} must start with '/' and name a non-root prefix",
                self.route
            )));
        }

        if self.root.is_empty() {
            return Err(config::ConfigError::Message(format!(
                "endpoint {} has an empty root directory",
                self.route
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(route: &str, root: &str) -> EndpointConfig {
        EndpointConfig {
            route: route.to_string(),
            root: root.to_string(),
            view: AclRule::default_view(),
            upload: AclRule::default_upload(),
            auth: None,
            preview: PreviewMode::None,
        }
    }

    #[test]
    fn test_validate_rejects_bad_routes() {
        for route in ["files", "/", "/files/"] {
            assert!(endpoint(route, "./data").validate().is_err());
        }
        assert!(endpoint("/files", "./data").validate().is_ok());
    }

    #[test]
    fn test_acl_rule_deserializes_from_strings() {
        #[derive(Deserialize)]
        struct Probe {
            rule: AclRule,
        }

        let probe: Probe = toml_from_str("rule = \"all\"");
        assert_eq!(probe.rule, AclRule::All);
        let probe: Probe = toml_from_str("rule = \"local\"");
        assert_eq!(probe.rule, AclRule::Local);
        let probe: Probe = toml_from_str("rule = { addrs = [\"10.0.0.5\"] }");
        assert_eq!(
            probe.rule,
            AclRule::Addrs(vec!["10.0.0.5".parse().unwrap()])
        );
    }

    fn toml_from_str<T: serde::de::DeserializeOwned>(raw: &str) -> T {
        Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_display_name_strips_route_prefix() {
        assert_eq!(endpoint("/files", "./data").display_name(), "files");
    }
}
