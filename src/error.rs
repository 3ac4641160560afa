use thiserror::Error;

/// Errores del núcleo de búsqueda.
///
/// El mapeo de resultados y la caché nunca fallan, así que sólo existen
/// dos formas de que una petición no produzca un envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Falta el texto de búsqueda (o está vacío tras `trim`).
    /// El proveedor externo no llega a invocarse.
    #[error("{0}")]
    Validation(String),

    /// El proveedor externo falló; lleva el mensaje original.
    #[error("search failed: {0}")]
    SearchFailed(String),
}

impl SearchError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` conserva la cadena de contextos de anyhow en una sola línea
        Self::SearchFailed(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_provider_error_keeps_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err = err.context("Error en request a Invidious").unwrap_err();

        let search_err = SearchError::from(err);
        assert_eq!(
            search_err,
            SearchError::SearchFailed("Error en request a Invidious: connection reset".into())
        );
        assert!(!search_err.is_client_error());
    }

    #[test]
    fn test_validation_is_client_error() {
        let err = SearchError::Validation("q or search query param required".into());
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "q or search query param required");
    }
}
