// src/utils/url.rs

//! URL resolution and identity helpers.

use sha2::{Digest, Sha256};
use url::Url;

/// Resolve a potentially relative link against a base URL.
///
/// Returns `None` for empty links, unparsable links, and links that do not
/// resolve to an http(s) URL. The returned URL is always absolute.
///
/// # Examples
/// ```
/// use url::Url;
/// use newsdesk::utils::url::resolve;
///
/// let base = Url::parse("https://boxwall.no/blogg").unwrap();
/// assert_eq!(
///     resolve(&base, "/post/first").unwrap().as_str(),
///     "https://boxwall.no/post/first"
/// );
/// ```
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Derive a stable opaque article identifier from its source URL.
///
/// The id is the first 16 hex characters of the SHA-256 digest of the URL,
/// so repeated ingestion runs assign the same id to the same article.
pub fn article_id(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(16);
    id
}
