use anyhow::{Context, Result};
use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{format_timestamp, RawResult, SearchProvider};

/// Proveedor que delega la búsqueda en el binario `yt-dlp`
pub struct YtDlpProvider {
    results_per_search: usize,
    // Limitar procesos concurrentes para evitar rate limiting
    permits: Semaphore,
}

/// Entrada de `--flat-playlist --dump-json`
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    channel: Option<String>,
    uploader: Option<String>,
    channel_url: Option<String>,
    uploader_url: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    thumbnails: Option<Vec<Thumbnail>>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl YtDlpProvider {
    pub fn new(results_per_search: usize) -> Self {
        Self {
            results_per_search: results_per_search.max(1),
            permits: Semaphore::new(3),
        }
    }

    /// Pseudo-URL `ytsearchN:` que yt-dlp entiende como búsqueda
    fn search_target(&self, query: &str) -> String {
        format!("ytsearch{}:{}", self.results_per_search, query)
    }
}

/// Parsea la salida de yt-dlp, un objeto JSON por línea.
/// Las líneas que no son JSON válido se descartan.
fn parse_output(stdout: &str) -> Vec<RawResult> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<YtDlpEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Línea de yt-dlp ignorada: {}", e);
                None
            }
        })
        .map(to_raw_result)
        .collect()
}

fn to_raw_result(entry: YtDlpEntry) -> RawResult {
    let seconds = entry
        .duration
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d.round() as u64);

    // yt-dlp lista las miniaturas de menor a mayor resolución
    let thumbnail = entry
        .thumbnails
        .and_then(|thumbs| thumbs.into_iter().last())
        .map(|t| t.url);

    RawResult {
        id: entry.id,
        title: entry.title,
        description: entry.description,
        duration_text: seconds.map(format_timestamp),
        duration_seconds: seconds,
        views: entry.view_count,
        author_name: entry.channel.or(entry.uploader),
        author_url: entry.channel_url.or(entry.uploader_url),
        url: entry.webpage_url.or(entry.url),
        thumbnail,
        uploaded_at: None,
    }
}

#[async_trait]
impl SearchProvider for YtDlpProvider {
    async fn search(&self, query: &str) -> Result<Vec<RawResult>> {
        let _permit = self.permits.acquire().await?;

        info!("🔍 Buscando con yt-dlp: {}", query);

        let search_query = self.search_target(query);

        let output = Command::new("yt-dlp")
            .args([
                "--flat-playlist",
                "--dump-json",
                "--skip-download",
                "--no-warnings",
                search_query.as_str(),
            ])
            .output()
            .await
            .context("Error al ejecutar yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            warn!("❌ yt-dlp falló con status: {}", output.status);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let results = parse_output(&stdout);

        info!("✅ yt-dlp: {} resultados", results.len());
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_flat_playlist_output() {
        let stdout = concat!(
            r#"{"id": "jfKfPfyJRdk", "title": "lofi hip hop radio", "duration": 245.4, "view_count": 42, "channel": "Lofi Girl", "channel_url": "https://www.youtube.com/channel/UCSJ4gkVC6NrvII8umztf0Ow", "url": "https://www.youtube.com/watch?v=jfKfPfyJRdk", "thumbnails": [{"url": "https://i.ytimg.com/vi/jfKfPfyJRdk/hqdefault.jpg"}, {"url": "https://i.ytimg.com/vi/jfKfPfyJRdk/maxresdefault.jpg"}]}"#,
            "\n",
            "WARNING: not json\n",
            "\n",
            r#"{"id": "abc", "uploader": "Someone", "duration": null}"#,
            "\n",
        );

        let results = parse_output(stdout);
        assert_eq!(results.len(), 2);

        assert_eq!(
            results[0],
            RawResult {
                id: Some("jfKfPfyJRdk".into()),
                title: Some("lofi hip hop radio".into()),
                description: None,
                duration_text: Some("4:05".into()),
                duration_seconds: Some(245),
                views: Some(42),
                author_name: Some("Lofi Girl".into()),
                author_url: Some(
                    "https://www.youtube.com/channel/UCSJ4gkVC6NrvII8umztf0Ow".into()
                ),
                url: Some("https://www.youtube.com/watch?v=jfKfPfyJRdk".into()),
                thumbnail: Some("https://i.ytimg.com/vi/jfKfPfyJRdk/maxresdefault.jpg".into()),
                uploaded_at: None,
            }
        );

        assert_eq!(results[1].author_name.as_deref(), Some("Someone"));
        assert_eq!(results[1].duration_seconds, None);
    }

    #[test]
    fn test_search_target_uses_batch_size() {
        assert_eq!(YtDlpProvider::new(20).search_target("lofi"), "ytsearch20:lofi");
        assert_eq!(YtDlpProvider::new(0).search_target("lofi"), "ytsearch1:lofi");
    }

    #[test]
    fn test_negative_duration_is_dropped() {
        let results = parse_output(r#"{"id": "x", "duration": -3.0}"#);
        assert_eq!(results[0].duration_seconds, None);
        assert_eq!(results[0].duration_text, None);
    }
}
