use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::search::SearchLimits;

/// Instancias públicas de Invidious usadas si no se configura ninguna
const DEFAULT_INVIDIOUS_INSTANCES: &[&str] = &[
    "https://yewtu.be",
    "https://inv.nadeko.net",
    "https://invidious.nerdvpn.de",
    "https://invidious.privacydev.net",
];

/// Proveedor de búsqueda a usar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Invidious con yt-dlp como respaldo
    Auto,
    Invidious,
    YtDlp,
}

impl FromStr for SearchBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "invidious" => Ok(Self::Invidious),
            "ytdlp" | "yt-dlp" => Ok(Self::YtDlp),
            other => anyhow::bail!("Backend de búsqueda desconocido: {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Servidor
    pub host: String,
    pub port: u16,

    // Caché
    pub cache_ttl: u64,          // En segundos
    pub cache_check_period: u64, // En segundos, 0 desactiva el barrido
    pub cache_capacity: usize,   // 0 = sin límite

    // Búsqueda
    pub default_max_results: usize,
    pub max_results_limit: usize,
    pub search_backend: SearchBackend,
    pub invidious_instances: Vec<String>,
    pub provider_timeout: u64, // En segundos
    pub ytdlp_batch_size: usize, // Resultados pedidos a yt-dlp por búsqueda

    // Límites
    pub rate_limit_max: u32,
    pub rate_limit_window: u64, // En segundos
    pub request_timeout: u64,   // En segundos

    // Features
    pub enable_cors: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Construye la configuración a partir de una fuente de variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let invidious_instances = match lookup("INVIDIOUS_INSTANCES") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            _ => defaults.invidious_instances,
        };

        Ok(Self {
            // Servidor
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,

            // Caché
            cache_ttl: parse_var(&lookup, "CACHE_TTL", defaults.cache_ttl)?,
            cache_check_period: parse_var(&lookup, "CACHE_CHECK_PERIOD", defaults.cache_check_period)?,
            cache_capacity: parse_var(&lookup, "CACHE_CAPACITY", defaults.cache_capacity)?,

            // Búsqueda
            default_max_results: parse_var(&lookup, "DEFAULT_MAX_RESULTS", defaults.default_max_results)?,
            max_results_limit: parse_var(&lookup, "MAX_RESULTS_LIMIT", defaults.max_results_limit)?,
            search_backend: parse_var(&lookup, "SEARCH_BACKEND", defaults.search_backend)?,
            invidious_instances,
            provider_timeout: parse_var(&lookup, "PROVIDER_TIMEOUT", defaults.provider_timeout)?,
            ytdlp_batch_size: parse_var(&lookup, "YTDLP_BATCH_SIZE", defaults.ytdlp_batch_size)?,

            // Límites
            rate_limit_max: parse_var(&lookup, "RATE_LIMIT_MAX", defaults.rate_limit_max)?,
            rate_limit_window: parse_var(&lookup, "RATE_LIMIT_WINDOW", defaults.rate_limit_window)?,
            request_timeout: parse_var(&lookup, "REQUEST_TIMEOUT", defaults.request_timeout)?,

            // Features
            enable_cors: parse_var(&lookup, "ENABLE_CORS", defaults.enable_cors)?,
        })
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Cache TTL, rate limit values and timeouts must be greater than 0
    /// - `DEFAULT_MAX_RESULTS` must lie in `1..=MAX_RESULTS_LIMIT`
    /// - `YTDLP_BATCH_SIZE` must lie in `1..=MAX_RESULTS_LIMIT`
    /// - Invidious backends need at least one instance
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl == 0 {
            anyhow::bail!("Cache TTL must be greater than 0");
        }

        if self.max_results_limit == 0 {
            anyhow::bail!("Max results limit must be greater than 0");
        }

        if self.default_max_results == 0 || self.default_max_results > self.max_results_limit {
            anyhow::bail!(
                "Default max results must be between 1 and {}, got: {}",
                self.max_results_limit,
                self.default_max_results
            );
        }

        if self.ytdlp_batch_size == 0 || self.ytdlp_batch_size > self.max_results_limit {
            anyhow::bail!(
                "yt-dlp batch size must be between 1 and {}, got: {}",
                self.max_results_limit,
                self.ytdlp_batch_size
            );
        }

        if self.rate_limit_max == 0 || self.rate_limit_window == 0 {
            anyhow::bail!("Rate limit values must be greater than 0");
        }

        if self.request_timeout == 0 || self.provider_timeout == 0 {
            anyhow::bail!("Timeouts must be greater than 0");
        }

        if self.search_backend != SearchBackend::YtDlp && self.invidious_instances.is_empty() {
            anyhow::bail!("At least one Invidious instance is required for {:?}", self.search_backend);
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            default_max_results: self.default_max_results,
            max_results_limit: self.max_results_limit,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn cache_check_period(&self) -> Option<Duration> {
        (self.cache_check_period > 0).then(|| Duration::from_secs(self.cache_check_period))
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Server: {} (CORS={})\n  \
            Cache: TTL {}, sweep {}, capacity {}\n  \
            Search: {:?} backend, {} default / {} max results, provider timeout {}\n  \
            Limits: {} requests per {}, request timeout {}",
            self.bind_address(),
            self.enable_cors,
            humantime::format_duration(self.cache_ttl()),
            self.cache_check_period()
                .map_or("off".to_string(), |p| humantime::format_duration(p).to_string()),
            if self.cache_capacity == 0 {
                "unbounded".to_string()
            } else {
                self.cache_capacity.to_string()
            },
            self.search_backend,
            self.default_max_results,
            self.max_results_limit,
            humantime::format_duration(Duration::from_secs(self.provider_timeout)),
            self.rate_limit_max,
            humantime::format_duration(self.rate_limit_window()),
            humantime::format_duration(self.request_timeout()),
        )
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        _ => Ok(default),
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,

            cache_ttl: 60,
            cache_check_period: 120,
            cache_capacity: 0,

            default_max_results: 10,
            max_results_limit: 50,
            search_backend: SearchBackend::Auto,
            invidious_instances: DEFAULT_INVIDIOUS_INSTANCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            provider_timeout: 10,
            ytdlp_batch_size: 20,

            rate_limit_max: 40,      // 40 requests por ventana
            rate_limit_window: 60,   // 1 minuto
            request_timeout: 30,

            enable_cors: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.cache_check_period(), Some(Duration::from_secs(120)));
        assert_eq!(config.search_limits(), SearchLimits::default());
        assert_eq!(config.search_backend, SearchBackend::Auto);
        assert_eq!(config.rate_limit_max, 40);
        assert_eq!(config.ytdlp_batch_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = from_vars(&[
            ("PORT", "8080"),
            ("CACHE_TTL", "300"),
            ("CACHE_CHECK_PERIOD", "0"),
            ("SEARCH_BACKEND", "yt-dlp"),
            ("INVIDIOUS_INSTANCES", "https://a.example, ,https://b.example"),
            ("ENABLE_CORS", "false"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.cache_check_period(), None);
        assert_eq!(config.search_backend, SearchBackend::YtDlp);
        assert_eq!(config.invidious_instances, vec!["https://a.example", "https://b.example"]);
        assert!(!config.enable_cors);
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = from_vars(&[("CACHE_TTL", "soon")]).unwrap_err();
        assert!(err.to_string().contains("CACHE_TTL"), "{}", err);
    }

    #[test]
    fn test_validation_rules() {
        let config = from_vars(&[("DEFAULT_MAX_RESULTS", "60")]).unwrap();
        assert!(config.validate().is_err());

        let config = from_vars(&[("CACHE_TTL", "0")]).unwrap();
        assert!(config.validate().is_err());

        let config = from_vars(&[("YTDLP_BATCH_SIZE", "0")]).unwrap();
        assert!(config.validate().is_err());

        let config = from_vars(&[("YTDLP_BATCH_SIZE", "50")]).unwrap();
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.invidious_instances.clear();
        assert!(config.validate().is_err());
        config.search_backend = SearchBackend::YtDlp;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_summary_mentions_key_values() {
        let summary = Config::default().summary();
        assert!(summary.contains("0.0.0.0:3000"));
        assert!(summary.contains("TTL 1m"));
        assert!(summary.contains("unbounded"));
    }
}
