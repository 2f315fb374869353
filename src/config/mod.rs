use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: BackendConfig,
    pub proxy: ProxyConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub rules_file: Option<PathBuf>,
    pub timeout_ms: u64,
    pub enable_cors: bool,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub config_dir: Option<PathBuf>,
    pub transport_base_url: Option<String>,
    pub timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("VOD_BACKEND_ORIGIN") {
            self.backend.origin = v.trim_end_matches('/').to_string();
        }

        // Proxy overrides
        if let Ok(v) = env::var("VOD_PROXY_HOST") {
            self.proxy.host = v;
        }
        if let Ok(v) = env::var("VOD_PROXY_PORT") {
            self.proxy.port = v.parse().unwrap_or(self.proxy.port);
        }
        if let Ok(v) = env::var("VOD_PROXY_RULES") {
            self.proxy.rules_file = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("VOD_PROXY_TIMEOUT_MS") {
            self.proxy.timeout_ms = v.parse().unwrap_or(self.proxy.timeout_ms);
        }
        if let Ok(v) = env::var("VOD_PROXY_CORS") {
            self.proxy.enable_cors = v.parse().unwrap_or(self.proxy.enable_cors);
        }
        if let Ok(v) = env::var("VOD_PROXY_MAX_BODY_BYTES") {
            self.proxy.max_body_bytes = v.parse().unwrap_or(self.proxy.max_body_bytes);
        }

        // Client overrides
        if let Ok(v) = env::var("VOD_CLIENT_CONFIG_DIR") {
            self.client.config_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("VOD_TRANSPORT_BASE_URL") {
            self.client.transport_base_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Ok(v) = env::var("VOD_TRANSPORT_TIMEOUT_MS") {
            self.client.timeout_ms = v.parse().unwrap_or(self.client.timeout_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            backend: BackendConfig {
                origin: "http://127.0.0.1:8000".to_string(),
            },
            proxy: ProxyConfig {
                host: "127.0.0.1".to_string(),
                port: 5173,
                rules_file: None,
                timeout_ms: 30_000,
                enable_cors: true,
                max_body_bytes: 50 * 1024 * 1024, // 50MB, uploads go through here
            },
            client: ClientConfig {
                config_dir: None,
                transport_base_url: None,
                timeout_ms: 30_000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            backend: BackendConfig {
                origin: "http://127.0.0.1:8000".to_string(),
            },
            proxy: ProxyConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                rules_file: None,
                timeout_ms: 10_000,
                enable_cors: false,
                max_body_bytes: 10 * 1024 * 1024,
            },
            client: ClientConfig {
                config_dir: None,
                transport_base_url: None,
                timeout_ms: 10_000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
