//! URL handling module for Tracker-Scout
//!
//! This module provides the origin check applied to every response and the
//! legacy-encoded query and form serialization the trackers expect.

use encoding_rs::WINDOWS_1251;
use url::form_urlencoded;

/// Checks that a resolved URL still belongs to one of the allowed origins
///
/// Origins are compared as string prefixes, so `https://site.org/forum/`
/// only admits URLs below that path.
///
/// # Examples
///
/// ```
/// use tracker_scout::url::belongs_to_origin;
///
/// let allowed = vec!["https://site.org/forum/".to_string()];
/// assert!(belongs_to_origin("https://site.org/forum/tracker.php?nm=x", &allowed));
/// assert!(!belongs_to_origin("https://blocked.example/stub", &allowed));
/// ```
pub fn belongs_to_origin(url: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|origin| url.starts_with(origin.as_str()))
}

/// Percent-encodes text in the Windows-1251 charset, spaces become `+`
///
/// Characters outside the charset are sent as numeric character references,
/// as a browser submitting a cp1251 form would.
pub fn encode_legacy(text: &str) -> String {
    let (bytes, _, _) = WINDOWS_1251.encode(text);
    form_urlencoded::byte_serialize(&bytes).collect()
}

/// Serializes form fields as a Windows-1251 `application/x-www-form-urlencoded` body
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode_legacy(key), encode_legacy(value)))
        .collect::<Vec<_>>()
        .join("&")
}
