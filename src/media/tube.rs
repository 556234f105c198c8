use crate::foundation::error::{MediaError, MediaResult};

/// Shortest accepted video id.
pub const MIN_VIDEO_ID_LEN: usize = 10;

const THUMBNAIL_BASE: &str = "https://i.ytimg.com/vi/";

/// Extract the video id from a watch URL, short link or bare id.
///
/// Handles `?v=<id>`, `?v=<id>&...`, `youtu.be/<id>?t=...` and a trailing path segment.
pub fn video_id_from_url(url: &str) -> MediaResult<String> {
    let url = url.trim();
    let after_slash = url.rfind('/').map_or(0, |i| i + 1);

    let id = match url.find('=') {
        Some(eq) => {
            if let Some(amp) = url.find('&').filter(|&amp| amp > eq) {
                &url[eq + 1..amp]
            } else if let Some(q) = url.find('?').filter(|_| url.contains("?t="))
                && q >= after_slash
            {
                &url[after_slash..q]
            } else {
                &url[eq + 1..]
            }
        }
        None => &url[after_slash..],
    };

    if id.contains(['?', '&', '/', '<', '%', '=']) {
        return Err(MediaError::validation(format!(
            "invalid characters in video id '{id}'"
        )));
    }
    if id.len() < MIN_VIDEO_ID_LEN {
        return Err(MediaError::validation(format!(
            "video id must be at least {MIN_VIDEO_ID_LEN} characters, got '{id}'"
        )));
    }
    Ok(id.to_string())
}

/// Thumbnail URLs to try for `id`, best resolution first.
pub fn thumbnail_urls(id: &str) -> [String; 2] {
    [
        format!("{THUMBNAIL_BASE}{id}/maxresdefault.jpg"),
        format!("{THUMBNAIL_BASE}{id}/hqdefault.jpg"),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/media/tube.rs"]
mod tests;
