use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form, Json,
};

use super::error::ApiError;
use crate::search::SearchParams;

/// Parámetros de búsqueda en la query string de un GET.
///
/// Los errores de deserialización salen como JSON igual que en POST.
#[derive(Debug)]
pub struct SearchQuery(pub SearchParams);

impl<S> FromRequestParts<S> for SearchQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<SearchParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(params))
    }
}

/// Parámetros de búsqueda en el cuerpo de un POST.
///
/// Acepta JSON y `application/x-www-form-urlencoded`. Con cualquier otro
/// tipo de contenido el cuerpo se ignora y la petición falla en la
/// validación del texto de búsqueda.
#[derive(Debug)]
pub struct SearchBody(pub SearchParams);

impl<S> FromRequest<S> for SearchBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") || content_type.contains("+json") {
            let Json(params) = Json::<SearchParams>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Self(params));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(params) = Form::<SearchParams>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Self(params));
        }

        Ok(Self(SearchParams::default()))
    }
}
