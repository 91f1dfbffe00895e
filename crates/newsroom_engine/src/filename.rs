use sha2::{Digest, Sha256};
use url::Url;

const DEFAULT_EXTENSION: &str = ".jpg";
/// Longer "extensions" (dot included) are assumed to be part of a path slug.
const MAX_EXTENSION_LEN: usize = 5;

/// Content-addressed image filename: `{hex(sha256("{title}_{url}"))[..32]}{ext}`.
///
/// Depends only on its inputs, so repeated runs map to the same cache entry.
pub fn asset_filename(title: &str, url: &str) -> String {
    let hash = content_hash(&format!("{title}_{url}"));
    format!("{hash}{}", extension_from_url(url))
}

/// Extension of the URL path (query and fragment ignored), `.jpg` when missing or implausible.
pub fn extension_from_url(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &last_segment[idx..];
            let plausible = ext.len() > 1
                && ext.len() <= MAX_EXTENSION_LEN
                && ext[1..].chars().all(|c| c.is_ascii_alphanumeric());
            if plausible {
                ext.to_ascii_lowercase()
            } else {
                DEFAULT_EXTENSION.to_string()
            }
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

fn content_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(32);
    for byte in digest.iter().take(16) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
