//! Environment-driven configuration with profile layering.
//!
//! Resolution order: base defaults → profile defaults → environment
//! variables. The variable name equals the field name (e.g. `PORT`,
//! `CORS_ORIGINS`). Production forces `debug` and `testing` off after the
//! merge, regardless of what the environment says.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::net::SocketAddr;

/// Named configuration variant. Unknown names resolve to `Development`;
/// that fallback is documented behavior, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Development,
    Testing,
    Production,
}

impl Profile {
    pub fn from_name(name: &str) -> Self {
        match name {
            "testing" => Self::Testing,
            "production" => Self::Production,
            _ => Self::Development,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }
}

/// Cross-origin policy: allow every origin, or an ordered allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parse `*` or a comma-separated list; entries are trimmed and empty
    /// entries skipped.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return Self::Any;
        }
        Self::List(
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Session cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Case-insensitive; unrecognized values fall back to `Lax`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "strict" => Self::Strict,
            "none" => Self::None,
            _ => Self::Lax,
        }
    }
}

impl<'de> Deserialize<'de> for SameSite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_name(&raw))
    }
}

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Case-insensitive; unrecognized values fall back to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            "critical" => Self::Critical,
            _ => Self::Info,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_name(&raw))
    }
}

/// Fully resolved settings. Built once at startup, read-only afterwards;
/// every field holds either an explicit override or a documented default.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub secret_key: String,
    #[serde(deserialize_with = "de_loose_bool")]
    pub debug: bool,
    #[serde(deserialize_with = "de_loose_bool")]
    pub testing: bool,
    pub host: String,
    pub port: u16,
    pub app_name: String,
    pub app_version: String,
    #[serde(deserialize_with = "de_loose_bool")]
    pub jsonify_prettyprint_regular: bool,
    #[serde(deserialize_with = "de_loose_bool")]
    pub json_sort_keys: bool,
    #[serde(deserialize_with = "de_loose_bool")]
    pub session_cookie_secure: bool,
    #[serde(deserialize_with = "de_loose_bool")]
    pub session_cookie_httponly: bool,
    pub session_cookie_samesite: SameSite,
    #[serde(deserialize_with = "de_loose_bool")]
    pub cors_enabled: bool,
    pub cors_origins: CorsOrigins,
    pub log_level: LogLevel,
    pub log_format: String,
    #[serde(skip)]
    pub env: Profile,
}

impl Settings {
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid listen address {}:{}: {e}", self.host, self.port))
    }
}

/// Resolve settings for the named profile, or for `FLASK_ENV` (default
/// `development`) when no name is given. Reads the live process environment.
pub fn resolve(profile_name: Option<&str>) -> Result<Settings, config::ConfigError> {
    let name = profile_name
        .map(str::to_owned)
        .or_else(|| std::env::var("FLASK_ENV").ok())
        .unwrap_or_else(|| "development".to_string());
    resolve_from(Profile::from_name(&name), None)
}

/// Pure resolution core: `(profile, environment snapshot) -> Settings`.
/// A `None` snapshot reads the process environment; tests pass an explicit
/// map so ambient variables cannot leak in.
pub fn resolve_from(
    profile: Profile,
    vars: Option<config::Map<String, String>>,
) -> Result<Settings, config::ConfigError> {
    let mut builder = config::Config::builder()
        .set_default("secret_key", "dev-secret-key-change-in-production")?
        .set_default("debug", false)?
        .set_default("testing", false)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 5000_i64)?
        .set_default("app_name", "Hello World API")?
        .set_default("app_version", "1.0.0")?
        .set_default("jsonify_prettyprint_regular", true)?
        .set_default("json_sort_keys", false)?
        .set_default("session_cookie_secure", true)?
        .set_default("session_cookie_httponly", true)?
        .set_default("session_cookie_samesite", "Lax")?
        .set_default("cors_enabled", true)?
        .set_default("cors_origins", "*")?
        .set_default("log_level", "INFO")?
        .set_default("log_format", "{time} - {name} - {level} - {message}")?;

    builder = match profile {
        Profile::Development => builder
            .set_default("debug", true)?
            .set_default("port", 5001_i64)?
            .set_default("session_cookie_secure", false)?,
        Profile::Testing => builder
            .set_default("debug", true)?
            .set_default("testing", true)?
            .set_default("secret_key", "test-secret-key-do-not-use-in-production")?
            .set_default("session_cookie_secure", false)?,
        Profile::Production => builder
            .set_default("secret_key", "CHANGE-THIS-IN-PRODUCTION-OR-SECURITY-IS-COMPROMISED")?,
    };

    let mut environment = config::Environment::default();
    if let Some(vars) = vars {
        environment = environment.source(Some(vars));
    }

    let resolved = builder.add_source(environment).build()?;
    let mut settings: Settings = resolved.try_deserialize()?;
    settings.env = profile;

    // Hardening exception: production never serves with debug or testing on,
    // no matter what the environment says.
    if profile == Profile::Production {
        settings.debug = false;
        settings.testing = false;
    }

    if settings.port == 0 {
        return Err(config::ConfigError::Message(
            "PORT must be in the range 1-65535".to_string(),
        ));
    }

    Ok(settings)
}

/// Boolean fields accept case-insensitive `true`/`1`/`yes` as true;
/// anything else is false.
fn de_loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    struct LooseBool;

    impl serde::de::Visitor<'_> for LooseBool {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean or a boolean-like string")
        }

        fn visit_bool<E: serde::de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<bool, E> {
            Ok(value == 1)
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<bool, E> {
            Ok(value == 1)
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<bool, E> {
            Ok(matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            ))
        }
    }

    deserializer.deserialize_any(LooseBool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn resolve_clean(profile: Profile) -> Settings {
        resolve_from(profile, Some(snapshot(&[]))).unwrap()
    }

    #[test]
    fn development_profile_defaults() {
        let settings = resolve_clean(Profile::Development);
        assert!(settings.debug);
        assert!(!settings.testing);
        assert_eq!(settings.env, Profile::Development);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 5001);
        assert!(!settings.session_cookie_secure);
        assert!(settings.session_cookie_httponly);
        assert_eq!(settings.secret_key, "dev-secret-key-change-in-production");
        assert!(settings.jsonify_prettyprint_regular);
        assert!(!settings.json_sort_keys);
        assert!(settings.cors_enabled);
        assert_eq!(settings.cors_origins, CorsOrigins::Any);
        assert_eq!(settings.session_cookie_samesite, SameSite::Lax);
        assert_eq!(settings.log_level, LogLevel::Info);
    }

    #[test]
    fn testing_profile_defaults() {
        let settings = resolve_clean(Profile::Testing);
        assert!(settings.testing);
        assert!(settings.debug);
        assert_eq!(settings.env, Profile::Testing);
        assert_eq!(settings.port, 5000);
        assert!(!settings.session_cookie_secure);
        assert_eq!(
            settings.secret_key,
            "test-secret-key-do-not-use-in-production"
        );
    }

    #[test]
    fn production_profile_defaults() {
        let settings = resolve_clean(Profile::Production);
        assert!(!settings.debug);
        assert!(!settings.testing);
        assert_eq!(settings.env, Profile::Production);
        assert_eq!(settings.port, 5000);
        assert!(settings.session_cookie_secure);
        assert_eq!(
            settings.secret_key,
            "CHANGE-THIS-IN-PRODUCTION-OR-SECURITY-IS-COMPROMISED"
        );
    }

    #[test]
    fn unknown_profile_name_falls_back_to_development() {
        assert_eq!(Profile::from_name("staging"), Profile::Development);
        assert_eq!(Profile::from_name(""), Profile::Development);
        assert_eq!(Profile::from_name("Production"), Profile::Development);

        let fallback = resolve_from(Profile::from_name("qa"), Some(snapshot(&[]))).unwrap();
        let development = resolve_clean(Profile::Development);
        assert_eq!(fallback.debug, development.debug);
        assert_eq!(fallback.port, development.port);
        assert_eq!(fallback.secret_key, development.secret_key);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = resolve_from(
            Profile::Development,
            Some(snapshot(&[
                ("HOST", "127.0.0.1"),
                ("PORT", "8080"),
                ("APP_NAME", "Greeter"),
                ("APP_VERSION", "2.5.0"),
                ("SECRET_KEY", "s3cr3t"),
                ("LOG_FORMAT", "{level} {message}"),
            ])),
        )
        .unwrap();

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.app_name, "Greeter");
        assert_eq!(settings.app_version, "2.5.0");
        assert_eq!(settings.secret_key, "s3cr3t");
        assert_eq!(settings.log_format, "{level} {message}");
    }

    #[test]
    fn loose_boolean_parsing() {
        for truthy in ["true", "TRUE", "1", "yes", "YES", "Yes"] {
            let settings =
                resolve_from(Profile::Development, Some(snapshot(&[("TESTING", truthy)]))).unwrap();
            assert!(settings.testing, "expected {truthy:?} to parse as true");
        }

        for falsy in ["false", "0", "no", "maybe", "on", ""] {
            let settings =
                resolve_from(Profile::Development, Some(snapshot(&[("TESTING", falsy)]))).unwrap();
            assert!(!settings.testing, "expected {falsy:?} to parse as false");
        }
    }

    #[test]
    fn production_ignores_debug_and_testing_overrides() {
        let settings = resolve_from(
            Profile::Production,
            Some(snapshot(&[("DEBUG", "true"), ("TESTING", "1")])),
        )
        .unwrap();
        assert!(!settings.debug);
        assert!(!settings.testing);
    }

    #[test]
    fn non_numeric_port_fails_resolution() {
        let result = resolve_from(
            Profile::Development,
            Some(snapshot(&[("PORT", "not-a-port")])),
        );
        assert!(result.is_err());
    }

    #[test]
    fn port_zero_is_rejected() {
        let result = resolve_from(Profile::Development, Some(snapshot(&[("PORT", "0")])));
        assert!(result.is_err());
    }

    #[test]
    fn cors_origins_list_is_trimmed() {
        let settings = resolve_from(
            Profile::Development,
            Some(snapshot(&[(
                "CORS_ORIGINS",
                "https://a.example.com , https://b.example.com,",
            )])),
        )
        .unwrap();

        assert_eq!(
            settings.cors_origins,
            CorsOrigins::List(vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string(),
            ])
        );
        assert!(settings.cors_origins.allows("https://a.example.com"));
        assert!(!settings.cors_origins.allows("https://evil.example.com"));
    }

    #[test]
    fn samesite_and_log_level_parse_loosely() {
        let settings = resolve_from(
            Profile::Development,
            Some(snapshot(&[
                ("SESSION_COOKIE_SAMESITE", "strict"),
                ("LOG_LEVEL", "warning"),
            ])),
        )
        .unwrap();
        assert_eq!(settings.session_cookie_samesite, SameSite::Strict);
        assert_eq!(settings.log_level, LogLevel::Warning);

        let settings = resolve_from(
            Profile::Development,
            Some(snapshot(&[
                ("SESSION_COOKIE_SAMESITE", "None"),
                ("LOG_LEVEL", "nonsense"),
            ])),
        )
        .unwrap();
        assert_eq!(settings.session_cookie_samesite, SameSite::None);
        assert_eq!(settings.log_level, LogLevel::Info);
    }
}
