// Configuration module entry point
// Loads layered configuration and exposes the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, ServiceConfig};

/// Plain environment variable selecting the listening port
pub const PORT_ENV: &str = "PORT";
/// Plain environment variables naming the deployment environment; the first
/// one set wins
pub const ENVIRONMENT_ENVS: [&str; 2] = ["FLASK_ENV", "APP_ENV"];

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the optional file,
    /// `FAULTLINE_*` variables (`__` separates sections), then `PORT` and
    /// `FLASK_ENV` (or its alias `APP_ENV`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    /// `load_from` with the plain variables read through `var`
    fn load_with(
        config_path: &str,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("service.name", "sevvy-test-server")?
            .set_default("service.display_name", "Sevvy Test Server")?
            .set_default("service.environment", "production")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default(
                "http.server_name",
                concat!("faultline/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("FAULTLINE")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if let Some(port) = var(PORT_ENV) {
            let port: u16 = port.trim().parse().map_err(|e| {
                config::ConfigError::Message(format!("Invalid {PORT_ENV} value '{port}': {e}"))
            })?;
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(environment) = ENVIRONMENT_ENVS.iter().find_map(|name| var(name)) {
            builder = builder.set_override("service.environment", environment)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if crate::logger::Level::parse(&self.logging.level).is_none() {
            return Err(config::ConfigError::Message(format!(
                "Unknown logging.level '{}' (expected error, warn, info or debug)",
                self.logging.level
            )));
        }
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    use types::{HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        service: ServiceConfig {
            name: "sevvy-test-server".to_string(),
            display_name: "Sevvy Test Server".to_string(),
            environment: "production".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            access_log: false,
            info_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig {
            keep_alive_timeout: 75,
            read_timeout: 5,
            write_timeout: 5,
            max_connections: None,
        },
        http: HttpConfig {
            server_name: "faultline-test".to_string(),
            max_body_size: 1024,
        },
    }
}
