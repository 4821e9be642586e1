// src/config/mod.rs
// All tunables come from the environment (.env supported), with safe defaults.

use std::str::FromStr;

/// Application configuration, built once at startup and injected into the
/// components that need it. Never re-read from the environment per call.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Database
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── OpenAI (direct endpoint)
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,

    // ── Azure OpenAI (managed endpoint, optional)
    pub azure_endpoint: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: String,

    // ── Speech
    pub stt_model: String,
    pub tts_model: String,
    pub tts_default_voice: String,

    // ── Audit log
    pub audit_log_path: String,

    // ── Server
    pub host: String,
    pub port: u16,

    // ── Timeouts (seconds)
    pub openai_timeout: u64,

    // ── Logging
    pub log_level: String,
}

/// Read an env var, trimming whitespace and trailing comments, falling back
/// to the default when missing or unparseable.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            clean.parse::<T>().unwrap_or(default)
        }
        Err(_) => default,
    }
}

/// Read an optional env var, treating empty values as absent.
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Load .env first if present; plain env vars still win.
        let _ = dotenvy::dotenv();

        Self {
            database_url: env_var_or("DATABASE_URL", "sqlite:oralexamtool.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),
            openai_api_key: env_var_opt("OPENAI_API_KEY"),
            openai_base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com".to_string()),
            model: env_var_or("ORALEX_MODEL", "gpt-4o-mini".to_string()),
            azure_endpoint: env_var_opt("AZURE_OPENAI_ENDPOINT"),
            azure_api_key: env_var_opt("AZURE_OPENAI_API_KEY"),
            azure_deployment: env_var_opt("AZURE_OPENAI_DEPLOYMENT"),
            azure_api_version: env_var_or("AZURE_OPENAI_API_VERSION", "2024-05-01-preview".to_string()),
            stt_model: env_var_or("ORALEX_STT_MODEL", "whisper-1".to_string()),
            tts_model: env_var_or("ORALEX_TTS_MODEL", "gpt-4o-mini-tts".to_string()),
            tts_default_voice: env_var_or("ORALEX_TTS_VOICE", "alloy".to_string()),
            audit_log_path: env_var_or("ORALEX_AUDIT_LOG", "supervisor_log.txt".to_string()),
            host: env_var_or("ORALEX_HOST", "0.0.0.0".to_string()),
            port: env_var_or("ORALEX_PORT", 8000),
            openai_timeout: env_var_or("ORALEX_OPENAI_TIMEOUT", 60),
            log_level: env_var_or("ORALEX_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when both managed-endpoint values are configured.
    pub fn has_managed_endpoint(&self) -> bool {
        self.azure_endpoint.is_some() && self.azure_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    // Env mutation is process-global; serialize tests that touch it.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn defaults_without_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("ORALEX_MODEL");
            std::env::remove_var("ORALEX_PORT");
        }
        let config = AppConfig::from_env();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.port, 8000);
        assert_eq!(config.tts_default_voice, "alloy");
    }

    #[test]
    fn env_var_or_strips_comments() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("ORALEX_TEST_TIMEOUT", "30 # seconds");
        }
        let val: u64 = env_var_or("ORALEX_TEST_TIMEOUT", 60);
        assert_eq!(val, 30);
        unsafe {
            std::env::remove_var("ORALEX_TEST_TIMEOUT");
        }
    }

    #[test]
    fn managed_endpoint_requires_both_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com");
            std::env::remove_var("AZURE_OPENAI_API_KEY");
        }
        let config = AppConfig::from_env();
        assert!(!config.has_managed_endpoint());
        unsafe {
            std::env::remove_var("AZURE_OPENAI_ENDPOINT");
        }
    }
}
