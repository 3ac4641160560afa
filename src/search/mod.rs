//! # Search Module
//!
//! Núcleo del servicio: validación de parámetros, caché por consulta
//! normalizada, mapeo de resultados y formato de la respuesta.
//!
//! ## Flujo
//!
//! 1. [`query::SearchParams`] se normaliza en un [`query::SearchRequest`]
//! 2. La [`query::QueryKey`] resultante se busca en la [`crate::cache::QueryCache`]
//! 3. En un miss se llama al [`crate::sources::SearchProvider`], se truncan
//!    los resultados a `maxResults` y se mapean con [`mapper::map_result`]
//! 4. [`format::format_items`] construye el envelope pedido
//!
//! La caché guarda items ya mapeados, nunca envelopes, de modo que una misma
//! entrada sirve cualquier formato de salida.

pub mod format;
pub mod handler;
pub mod mapper;
pub mod query;

use serde::Serialize;

pub use format::{format_items, Envelope, ResponseFormat};
pub use handler::SearchHandler;
pub use mapper::map_result;
pub use query::{ParamSource, QueryKey, SearchLimits, SearchParams, SearchRequest};

/// Representación pública de un video.
///
/// Todas las URLs derivadas son funciones deterministas de `id`; si `id`
/// está vacío son cadenas vacías.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_text: String,
    pub duration_seconds: u64,
    pub views: u64,
    pub author: Option<Author>,
    pub canonical_url: String,
    pub watch_url: String,
    pub music_url: String,
    pub short_url: String,
    pub thumbnail_url: String,
    pub thumbnail_hq_url: String,
    pub uploaded_at: Option<String>,
}

/// Canal o autor del video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub url: String,
}
