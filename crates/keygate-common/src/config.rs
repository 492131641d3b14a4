//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config file > defaults

use serde::Deserialize;

/// Build the application configuration.
///
/// `config_file` is a path without extension (e.g. `config` picks up `config.toml`);
/// the file is optional. The result is handed to whoever needs it; nothing is
/// stored globally.
pub fn load(config_file: &str) -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8888)?
        .set_default("auth.algorithm", "HS256")?
        .set_default("auth.token_ttl_secs", 10)?
        .set_default("auth.leeway_secs", 0)?
        // Optional config file
        .add_source(config::File::with_name(config_file).required(false))
        // Environment variables (KEYGATE_SERVER__PORT, KEYGATE_AUTH__JWT_SECRET, etc.)
        .add_source(
            config::Environment::with_prefix("KEYGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    cfg.try_deserialize()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret. Issuer and every validator must use the same value.
    pub jwt_secret: String,
    /// HMAC algorithm name: HS256, HS384 or HS512
    pub algorithm: String,
    /// Token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Clock-skew tolerance for the expiry check, in seconds
    pub leeway_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Environment variables are process-wide; tests touching them take turns.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 4] = [
        "KEYGATE_AUTH__JWT_SECRET",
        "KEYGATE_SERVER__PORT",
        "KEYGATE_AUTH__TOKEN_TTL_SECS",
        "KEYGATE_AUTH__ALGORITHM",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            // SAFETY: every test that reads or writes these variables holds ENV_LOCK.
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: see clear_env.
        unsafe { std::env::set_var(key, value) };
    }

    /// Write a TOML file with a per-test name and return its path.
    fn config_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "keygate-config-{}-{name}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_fill_everything_but_the_secret() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let path = config_file("defaults", "[auth]\njwt_secret = \"from-file\"\n");

        let cfg = load(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8888);
        assert_eq!(cfg.auth.jwt_secret, "from-file");
        assert_eq!(cfg.auth.algorithm, "HS256");
        assert_eq!(cfg.auth.token_ttl_secs, 10);
        assert_eq!(cfg.auth.leeway_secs, 0);
    }

    #[test]
    fn environment_overrides_file_and_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let path = config_file(
            "env-override",
            "[server]\nport = 9000\n\n[auth]\njwt_secret = \"from-file\"\ntoken_ttl_secs = 30\n",
        );
        set_env("KEYGATE_AUTH__JWT_SECRET", "from-env");
        set_env("KEYGATE_SERVER__PORT", "9100");

        let cfg = load(path.to_str().unwrap());
        clear_env();
        std::fs::remove_file(&path).ok();
        let cfg = cfg.unwrap();

        assert_eq!(cfg.auth.jwt_secret, "from-env");
        assert_eq!(cfg.server.port, 9100);
        // File beats defaults where the environment is silent.
        assert_eq!(cfg.auth.token_ttl_secs, 30);
        assert_eq!(cfg.auth.algorithm, "HS256");
    }

    #[test]
    fn missing_secret_fails_to_load() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let path = std::env::temp_dir().join(format!(
            "keygate-config-{}-absent.toml",
            std::process::id()
        ));

        assert!(load(path.to_str().unwrap()).is_err());
    }
}
