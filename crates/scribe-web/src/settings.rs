//! Listener and upload-limit settings.

use std::net::{IpAddr, SocketAddr};

use scribe_core::config_file::{ConfigError, ConfigFile};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_MB: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl ServerSettings {
    /// Resolve from the `[server]` config section, then `SCRIBE_HOST`,
    /// `SCRIBE_PORT` and `SCRIBE_MAX_UPLOAD_MB` read through `lookup`.
    pub fn resolve(
        file: &ConfigFile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        if let Some(server) = &file.server {
            if let Some(host) = &server.host {
                settings.host = host.clone();
            }
            if let Some(port) = server.port {
                settings.port = port;
            }
            if let Some(mb) = server.max_upload_mb {
                settings.max_upload_mb = mb;
            }
        }

        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(host) = get("SCRIBE_HOST") {
            settings.host = host;
        }
        if let Some(port) = get("SCRIBE_PORT") {
            settings.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SCRIBE_PORT",
                message: format!("'{port}' is not a port number"),
            })?;
        }
        if let Some(mb) = get("SCRIBE_MAX_UPLOAD_MB") {
            settings.max_upload_mb = mb.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SCRIBE_MAX_UPLOAD_MB",
                message: format!("'{mb}' is not a whole number of megabytes"),
            })?;
        }

        if settings.max_upload_mb == 0 {
            return Err(ConfigError::Invalid {
                key: "server.max_upload_mb",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(settings)
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            key: "server.host",
            message: format!("'{}' is not an IP address", self.host),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb as usize * 1024 * 1024
    }
}
