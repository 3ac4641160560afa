use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashSet;

use super::Item;

/// Forma de la respuesta pedida con `format`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Array,
    Single,
    ObjectMap,
}

impl ResponseFormat {
    /// Cualquier valor desconocido cae en `Array`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Self::Single,
            "object" | "map" | "objectmap" => Self::ObjectMap,
            _ => Self::Array,
        }
    }
}

/// Cuerpo JSON de una respuesta exitosa
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Array(Vec<Item>),
    /// `None` se serializa como `{}`, nunca como `null`
    Single(Option<Item>),
    /// Pares `(clave, item)` en orden de aparición
    ObjectMap(Vec<(String, Item)>),
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Array(items) => items.serialize(serializer),
            Self::Single(Some(item)) => item.serialize(serializer),
            Self::Single(None) => serializer.serialize_map(Some(0))?.end(),
            Self::ObjectMap(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in entries {
                    map.serialize_entry(key, item)?;
                }
                map.end()
            }
        }
    }
}

/// Da forma a una secuencia de items según el formato pedido.
///
/// `ObjectMap` con exactamente un item devuelve ese item directamente, sin
/// envolverlo en un mapa. Los clientes existentes dependen de esa forma.
pub fn format_items(items: &[Item], mode: ResponseFormat) -> Envelope {
    match mode {
        ResponseFormat::Array => Envelope::Array(items.to_vec()),
        ResponseFormat::Single => Envelope::Single(items.first().cloned()),
        ResponseFormat::ObjectMap if items.len() == 1 => Envelope::Single(items.first().cloned()),
        ResponseFormat::ObjectMap => Envelope::ObjectMap(keyed_entries(items)),
    }
}

/// Clave por `id`; los items sin id, o con un id ya usado, reciben el
/// tamaño actual del mapa como clave, incrementado hasta no colisionar.
fn keyed_entries(items: &[Item]) -> Vec<(String, Item)> {
    let mut used = HashSet::with_capacity(items.len());
    let mut entries = Vec::with_capacity(items.len());

    for item in items {
        let key = if !item.id.is_empty() && !used.contains(&item.id) {
            item.id.clone()
        } else {
            let mut position = entries.len();
            while used.contains(&position.to_string()) {
                position += 1;
            }
            position.to_string()
        };

        used.insert(key.clone());
        entries.push((key, item.clone()));
    }

    entries
}
