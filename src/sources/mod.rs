pub mod fallback;
pub mod invidious;
pub mod ytdlp;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, SearchBackend};

pub use fallback::FallbackProvider;
pub use invidious::InvidiousProvider;
pub use ytdlp::YtDlpProvider;

/// Trait común para todos los proveedores de búsqueda de video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Busca videos para el texto dado, en el orden de relevancia del proveedor
    async fn search(&self, query: &str) -> Result<Vec<RawResult>>;

    /// Nombre del proveedor
    fn name(&self) -> &'static str;
}

/// Registro tal como lo entrega un proveedor.
///
/// Cualquier campo puede faltar; [`crate::search::mapper`] decide los valores
/// por defecto.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResult {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Duración legible, por ejemplo `"3:45"`
    pub duration_text: Option<String>,
    pub duration_seconds: Option<u64>,
    pub views: Option<u64>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    /// URL canónica del video
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    /// Tiempo relativo de subida, por ejemplo `"2 years ago"`
    pub uploaded_at: Option<String>,
}

/// Convierte segundos al formato `m:ss` o `h:mm:ss`
pub fn format_timestamp(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Construye el proveedor configurado en `SEARCH_BACKEND`
pub fn build_provider(config: &Config) -> Result<Arc<dyn SearchProvider>> {
    let timeout = Duration::from_secs(config.provider_timeout);

    let provider: Arc<dyn SearchProvider> = match config.search_backend {
        SearchBackend::Invidious => Arc::new(InvidiousProvider::new(
            config.invidious_instances.clone(),
            timeout,
        )?),
        SearchBackend::YtDlp => Arc::new(YtDlpProvider::new(config.ytdlp_batch_size)),
        SearchBackend::Auto => {
            let invidious: Arc<dyn SearchProvider> = Arc::new(InvidiousProvider::new(
                config.invidious_instances.clone(),
                timeout,
            )?);
            let ytdlp: Arc<dyn SearchProvider> =
                Arc::new(YtDlpProvider::new(config.ytdlp_batch_size));
            Arc::new(FallbackProvider::new(vec![invidious, ytdlp], timeout))
        }
    };

    info!("🔎 Proveedor de búsqueda: {}", provider.name());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "0:00");
        assert_eq!(format_timestamp(59), "0:59");
        assert_eq!(format_timestamp(225), "3:45");
        assert_eq!(format_timestamp(3723), "1:02:03");
    }

    #[test]
    fn test_build_provider_follows_backend() {
        let mut config = Config::default();
        assert_eq!(build_provider(&config).unwrap().name(), "fallback");

        config.search_backend = SearchBackend::YtDlp;
        assert_eq!(build_provider(&config).unwrap().name(), "yt-dlp");

        config.search_backend = SearchBackend::Invidious;
        assert_eq!(build_provider(&config).unwrap().name(), "Invidious");

        config.invidious_instances.clear();
        assert!(build_provider(&config).is_err());
    }
}
