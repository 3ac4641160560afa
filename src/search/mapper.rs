use super::{Author, Item};
use crate::sources::RawResult;

const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";
const MUSIC_BASE: &str = "https://music.youtube.com/watch?v=";
const SHORT_BASE: &str = "https://youtu.be/";
const THUMBNAIL_BASE: &str = "https://i.ytimg.com/vi/";

/// Convierte un [`RawResult`] en el [`Item`] público.
///
/// Función total: los campos ausentes (o en blanco) toman su valor por
/// defecto, nunca producen error.
pub fn map_result(raw: RawResult) -> Item {
    let id = present(raw.id).unwrap_or_default();

    let (watch_url, music_url, short_url, default_thumbnail, thumbnail_hq_url) = if id.is_empty() {
        Default::default()
    } else {
        (
            format!("{}{}", WATCH_BASE, id),
            format!("{}{}", MUSIC_BASE, id),
            format!("{}{}", SHORT_BASE, id),
            format!("{}{}/hqdefault.jpg", THUMBNAIL_BASE, id),
            format!("{}{}/maxresdefault.jpg", THUMBNAIL_BASE, id),
        )
    };

    let author = match (present(raw.author_name), present(raw.author_url)) {
        (None, None) => None,
        (name, url) => Some(Author {
            name: name.unwrap_or_default(),
            url: url.unwrap_or_default(),
        }),
    };

    Item {
        title: present(raw.title).unwrap_or_default(),
        description: present(raw.description).unwrap_or_default(),
        duration_text: present(raw.duration_text).unwrap_or_default(),
        duration_seconds: raw.duration_seconds.unwrap_or(0),
        views: raw.views.unwrap_or(0),
        author,
        canonical_url: present(raw.url).unwrap_or_else(|| watch_url.clone()),
        thumbnail_url: present(raw.thumbnail).unwrap_or(default_thumbnail),
        thumbnail_hq_url,
        uploaded_at: present(raw.uploaded_at),
        watch_url,
        music_url,
        short_url,
        id,
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
