//! # yt-search-api
//!
//! Servicio HTTP que delega la búsqueda de videos en un proveedor externo,
//! guarda en caché los resultados mapeados por consulta normalizada y los
//! devuelve como JSON en forma de array, objeto único o mapa por id.

pub mod cache;
pub mod config;
pub mod error;
pub mod search;
pub mod server;
pub mod sources;
