use serde::Deserialize;

use super::format::ResponseFormat;
use crate::error::SearchError;

/// Filtro que agrega `" music"` al texto enviado al proveedor
pub const MUSIC_FILTER: &str = "music";

/// Límites de `maxResults` tomados de la configuración
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub default_max_results: usize,
    pub max_results_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_max_results: 10,
            max_results_limit: 50,
        }
    }
}

impl SearchLimits {
    pub fn clamp(&self, max_results: usize) -> usize {
        max_results.clamp(1, self.max_results_limit.max(1))
    }
}

/// Clave normalizada de la caché: `(texto, maxResults, filtro)`.
///
/// Dos peticiones con la misma clave comparten entrada de caché. La
/// normalización es idempotente: reconstruir una clave a partir de sus
/// propios campos devuelve la misma clave.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    query: String,
    max_results: usize,
    filter: String,
}

impl QueryKey {
    pub fn new(query: &str, max_results: usize, filter: &str, limits: &SearchLimits) -> Self {
        Self {
            query: query.trim().to_string(),
            max_results: limits.clamp(max_results),
            filter: filter.trim().to_lowercase(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_music(&self) -> bool {
        self.filter == MUSIC_FILTER
    }

    /// Texto que recibe el proveedor externo
    pub fn search_text(&self) -> String {
        if self.is_music() {
            format!("{} music", self.query)
        } else {
            self.query.clone()
        }
    }
}

/// Valor escalar tal como llega en query string, formulario o JSON
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Entero con la semántica de `parseInt`: se toma el prefijo numérico
    /// (`"12abc"` → 12) y cualquier otra cosa no es un número.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(_) => None,
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Float(_) => None,
            Self::Text(s) => {
                let s = s.trim();
                let sign_len = usize::from(s.starts_with(['-', '+']));
                let digits = s[sign_len..]
                    .bytes()
                    .take_while(u8::is_ascii_digit)
                    .count();
                if digits == 0 {
                    return None;
                }
                s[..sign_len + digits].parse().ok()
            }
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
        }
    }
}

/// Origen de los parámetros; decide la precedencia entre `q` y `search`
/// y el mensaje de validación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Query,
    Body,
}

impl ParamSource {
    fn missing_query_message(self) -> &'static str {
        match self {
            Self::Query => "q or search query param required",
            Self::Body => "search (or q) is required in body",
        }
    }
}

/// Parámetros de entrada sin validar
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<Scalar>,
    pub search: Option<Scalar>,
    #[serde(alias = "max_results", alias = "maxresults")]
    pub max_results: Option<Scalar>,
    pub filter: Option<Scalar>,
    pub format: Option<Scalar>,
    pub single: Option<Scalar>,
}

/// Petición validada y normalizada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub key: QueryKey,
    pub format: ResponseFormat,
}

impl SearchParams {
    /// Valida y normaliza los parámetros.
    ///
    /// `single` fuerza formato [`ResponseFormat::Single`] y un `maxResults`
    /// efectivo de 1.
    pub fn normalize(
        &self,
        source: ParamSource,
        limits: &SearchLimits,
    ) -> Result<SearchRequest, SearchError> {
        let candidates = match source {
            ParamSource::Query => [&self.q, &self.search],
            ParamSource::Body => [&self.search, &self.q],
        };

        let query = candidates
            .into_iter()
            .flatten()
            .map(Scalar::as_text)
            .find(|text| !text.trim().is_empty())
            .ok_or_else(|| SearchError::Validation(source.missing_query_message().to_string()))?;

        let single = self.single.as_ref().is_some_and(Scalar::is_truthy);

        let max_results = if single {
            1
        } else {
            self.max_results
                .as_ref()
                .and_then(Scalar::as_int)
                .map(|n| n.clamp(0, i64::from(u32::MAX)) as usize)
                .unwrap_or(limits.default_max_results)
        };

        let filter = self.filter.as_ref().map(Scalar::as_text).unwrap_or_default();

        let format = if single {
            ResponseFormat::Single
        } else {
            self.format
                .as_ref()
                .map(|f| ResponseFormat::parse(&f.as_text()))
                .unwrap_or_default()
        };

        Ok(SearchRequest {
            key: QueryKey::new(&query, max_results, &filter, limits),
            format,
        })
    }
}
