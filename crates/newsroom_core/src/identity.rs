use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Query keys that only carry campaign/click attribution.
const TRACKING_KEYS: &[&str] = &[
    "gclid", "fbclid", "yclid", "msclkid", "mc_cid", "mc_eid", "igshid", "ref_src",
];

/// Stable fingerprint of a source item, derived only from its link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// `{hex(sha256(canonical_link))[..32]}`
    pub fn from_link(link: &str) -> Self {
        let canonical = canonicalize_link(link);
        let digest = Sha256::digest(canonical.as_bytes());
        let mut hex = String::with_capacity(32);
        for byte in digest.iter().take(16) {
            use std::fmt::Write;
            let _ = write!(&mut hex, "{byte:02x}");
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a link used for identity:
/// - scheme and host lower-cased, default port and fragment dropped
/// - tracking query parameters (`utm_*`, click ids) removed
/// - trailing slash stripped from the path
///
/// Unparseable input is only trimmed, so identity still never fails.
pub fn canonicalize_link(link: &str) -> String {
    let trimmed = link.trim();
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return trimmed.trim_end_matches('/').to_string(),
    };
    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_key(key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept.iter());
        }
    }

    let path = url.path().to_string();
    let trimmed_path = path.trim_end_matches('/');
    if trimmed_path.len() != path.len() && !trimmed_path.is_empty() {
        url.set_path(trimmed_path);
    }

    let serialized = url.to_string();
    if url.query().is_none() {
        serialized.trim_end_matches('/').to_string()
    } else {
        serialized
    }
}

fn is_tracking_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_KEYS.contains(&key.as_str())
}
