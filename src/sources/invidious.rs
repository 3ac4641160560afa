use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{format_timestamp, RawResult, SearchProvider};

const YOUTUBE_BASE: &str = "https://www.youtube.com";

/// Cliente para la API de Invidious (alternativa a YouTube API)
pub struct InvidiousProvider {
    client: reqwest::Client,
    instances: Vec<Url>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousSearchResult {
    #[serde(rename = "type")]
    kind: Option<String>,
    video_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    length_seconds: Option<u64>,
    view_count: Option<u64>,
    author: Option<String>,
    author_url: Option<String>,
    video_thumbnails: Option<Vec<Thumbnail>>,
    published_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    quality: Option<String>,
    url: Option<String>,
    width: Option<u32>,
}

impl InvidiousProvider {
    pub fn new(instances: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .context("Error creando cliente HTTP")?;

        let instances = instances
            .iter()
            .map(String::as_str)
            .map(parse_instance)
            .collect::<Result<Vec<_>>>()?;

        if instances.is_empty() {
            anyhow::bail!("Se requiere al menos una instancia de Invidious");
        }

        Ok(Self { client, instances })
    }

    async fn try_search(&self, instance: &Url, query: &str) -> Result<Vec<RawResult>> {
        let url = search_endpoint(instance)?;

        let response = self
            .client
            .get(url)
            .query(&[("q", query), ("type", "video"), ("sort_by", "relevance"), ("page", "1")])
            .send()
            .await
            .context("Error en request a Invidious")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let results: Vec<InvidiousSearchResult> = response
            .json()
            .await
            .context("Error parseando respuesta JSON")?;

        Ok(results
            .into_iter()
            .filter(|r| r.kind.as_deref().map_or(true, |k| k == "video"))
            .map(|r| to_raw_result(r, instance))
            .collect())
    }
}

/// La ruta de la instancia termina siempre en `/` para que `join` la conserve
fn parse_instance(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Instancia inválida: {}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn search_endpoint(instance: &Url) -> Result<Url> {
    instance
        .join("api/v1/search")
        .context("Error construyendo URL de búsqueda")
}

/// Convierte un resultado de Invidious al registro común
fn to_raw_result(result: InvidiousSearchResult, instance: &Url) -> RawResult {
    // Las miniaturas pueden venir relativas a la instancia
    let thumbnail = result.video_thumbnails.and_then(|thumbs| {
        let thumbs: Vec<_> = thumbs.into_iter().filter(|t| t.url.is_some()).collect();
        let chosen = thumbs
            .iter()
            .position(|t| t.quality.as_deref() == Some("high"))
            .or_else(|| thumbs.iter().position(|t| t.width.unwrap_or(0) >= 320));
        chosen
            .and_then(|i| thumbs.into_iter().nth(i))
            .and_then(|t| t.url)
            .and_then(|url| absolutize(instance, &url))
    });

    let author_url = result.author_url.and_then(|path| {
        Url::parse(YOUTUBE_BASE)
            .ok()
            .and_then(|base| absolutize(&base, &path))
    });

    let url = result
        .video_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| format!("{}/watch?v={}", YOUTUBE_BASE, id));

    RawResult {
        id: result.video_id,
        title: result.title,
        description: result.description,
        duration_text: result.length_seconds.map(format_timestamp),
        duration_seconds: result.length_seconds,
        views: result.view_count,
        author_name: result.author,
        author_url,
        url,
        thumbnail,
        uploaded_at: result.published_text,
    }
}

fn absolutize(base: &Url, raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    base.join(raw).ok().map(String::from)
}

#[async_trait]
impl SearchProvider for InvidiousProvider {
    async fn search(&self, query: &str) -> Result<Vec<RawResult>> {
        info!("🔍 Buscando en Invidious: {}", query);

        let mut last_error = None;
        let mut answered = false;

        // Intentar con todas las instancias disponibles
        for instance in &self.instances {
            match self.try_search(instance, query).await {
                Ok(results) if !results.is_empty() => {
                    info!("✅ Búsqueda exitosa en {}: {} resultados", instance, results.len());
                    return Ok(results);
                }
                Ok(_) => {
                    warn!("⚠️ {} devolvió 0 resultados", instance);
                    answered = true;
                }
                Err(e) => {
                    warn!("❌ Falló búsqueda en {}: {:#}", instance, e);
                    last_error = Some(format!("{}: {:#}", instance, e));
                }
            }
        }

        if answered {
            debug!("Ninguna instancia encontró resultados para: {}", query);
            return Ok(Vec::new());
        }

        anyhow::bail!(
            "Falló búsqueda en todas las instancias de Invidious. Último error: {}",
            last_error.unwrap_or_default()
        )
    }

    fn name(&self) -> &'static str {
        "Invidious"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"[
        {
            "type": "video",
            "title": "Tum Hi Ho",
            "videoId": "Umqb9KENgmk",
            "author": "T-Series",
            "authorUrl": "/channel/UCq-Fj5jknLsUf-MWSy4_brA",
            "videoThumbnails": [
                {"quality": "maxres", "url": "/vi/Umqb9KENgmk/maxres.jpg", "width": 1280, "height": 720},
                {"quality": "high", "url": "/vi/Umqb9KENgmk/hqdefault.jpg", "width": 480, "height": 360}
            ],
            "description": "Aashiqui 2",
            "viewCount": 1200000,
            "publishedText": "10 years ago",
            "lengthSeconds": 262
        },
        {
            "type": "channel",
            "author": "Arijit Singh",
            "authorId": "UCDxKh1gFWeYsqePvgVzmPoQ"
        }
    ]"#;

    fn instance() -> Url {
        Url::parse("https://yewtu.be").unwrap()
    }

    #[test]
    fn test_search_result_maps_to_raw_result() {
        let results: Vec<InvidiousSearchResult> = serde_json::from_str(SAMPLE).unwrap();
        let raw = to_raw_result(results.into_iter().next().unwrap(), &instance());

        assert_eq!(
            raw,
            RawResult {
                id: Some("Umqb9KENgmk".into()),
                title: Some("Tum Hi Ho".into()),
                description: Some("Aashiqui 2".into()),
                duration_text: Some("4:22".into()),
                duration_seconds: Some(262),
                views: Some(1_200_000),
                author_name: Some("T-Series".into()),
                author_url: Some(
                    "https://www.youtube.com/channel/UCq-Fj5jknLsUf-MWSy4_brA".into()
                ),
                url: Some("https://www.youtube.com/watch?v=Umqb9KENgmk".into()),
                thumbnail: Some("https://yewtu.be/vi/Umqb9KENgmk/hqdefault.jpg".into()),
                uploaded_at: Some("10 years ago".into()),
            }
        );
    }

    #[test]
    fn test_non_video_entries_deserialize_without_fields() {
        let results: Vec<InvidiousSearchResult> = serde_json::from_str(SAMPLE).unwrap();
        let channel = &results[1];
        assert_eq!(channel.kind.as_deref(), Some("channel"));
        assert!(channel.video_id.is_none());
    }

    #[test]
    fn test_absolute_thumbnail_is_kept() {
        let base = instance();
        assert_eq!(
            absolutize(&base, "https://i.ytimg.com/vi/x/hq.jpg").as_deref(),
            Some("https://i.ytimg.com/vi/x/hq.jpg")
        );
        assert_eq!(absolutize(&base, "  "), None);
    }

    #[test]
    fn test_thumbnail_without_url_is_skipped() {
        let json = r#"[{
            "type": "video",
            "videoId": "abc",
            "videoThumbnails": [
                {"quality": "high", "width": 480},
                {"quality": "medium", "url": "/vi/abc/mqdefault.jpg", "width": 320}
            ]
        }]"#;

        let results: Vec<InvidiousSearchResult> = serde_json::from_str(json).unwrap();
        let raw = to_raw_result(results.into_iter().next().unwrap(), &instance());
        assert_eq!(raw.thumbnail.as_deref(), Some("https://yewtu.be/vi/abc/mqdefault.jpg"));
    }

    #[test]
    fn test_search_endpoint_keeps_instance_path() {
        for (raw, expected) in [
            ("https://yewtu.be", "https://yewtu.be/api/v1/search"),
            ("https://host.example/invidious", "https://host.example/invidious/api/v1/search"),
            ("https://host.example/invidious/", "https://host.example/invidious/api/v1/search"),
        ] {
            let instance = parse_instance(raw).unwrap();
            assert_eq!(search_endpoint(&instance).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_requires_instances() {
        assert!(InvidiousProvider::new(Vec::new(), Duration::from_secs(5)).is_err());
        assert!(InvidiousProvider::new(vec!["not a url".into()], Duration::from_secs(5)).is_err());
    }
}
