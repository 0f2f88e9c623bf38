use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

/// Where a signed-in user lands when no usable target was supplied
pub const DEFAULT_REDIRECT: &str = "/";

const MAX_REDIRECT_LENGTH: usize = 2048;

// Path traversal
static PATH_TRAVERSAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\.").expect("static regex is valid"));

// Scheme prefixes and protocol-relative `//host` forms
static PROTOCOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:|/{2,}|/\\)").expect("static regex is valid")
});

// Control characters, encoded line breaks and NULs, backslashes
static SUSPICIOUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\x00-\x1F\x7F]|%(?:00|0a|0d|09|5c)|\\").expect("static regex is valid")
});

/// Validate a post-login redirect target
///
/// Only same-origin relative paths (`/dashboard?tab=1`) are accepted. Returns
/// the target unchanged when valid.
#[must_use]
pub fn validate_post_auth_redirect(redirect_url: &str) -> Option<String> {
    debug!("Validating post-authentication redirect URL: {redirect_url}");

    if redirect_url.len() > MAX_REDIRECT_LENGTH {
        warn!("Excessively long redirect URL: {} characters", redirect_url.len());
        return None;
    }

    if !redirect_url.starts_with('/') {
        warn!("Rejected non-relative redirect URL: {redirect_url}");
        return None;
    }

    for candidate in decoded_variants(redirect_url) {
        if PROTOCOL_PATTERN.is_match(&candidate) {
            warn!("Protocol injection attempt detected: {redirect_url}");
            return None;
        }
        if PATH_TRAVERSAL_PATTERN.is_match(&candidate) {
            warn!("Path traversal attempt detected: {redirect_url}");
            return None;
        }
        if SUSPICIOUS_PATTERN.is_match(&candidate) {
            warn!("Suspicious pattern detected: {redirect_url}");
            return None;
        }
    }

    Some(redirect_url.to_string())
}

/// Valid redirect target, or [`DEFAULT_REDIRECT`]
#[must_use]
pub fn redirect_target_or_default(redirect_url: Option<&str>) -> String {
    redirect_url
        .filter(|url| !url.is_empty())
        .and_then(validate_post_auth_redirect)
        .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
}

/// The raw value plus its single and double URL-decoded forms
fn decoded_variants(value: &str) -> Vec<String> {
    let mut variants = vec![value.to_string()];
    if let Ok(once) = urlencoding::decode(value) {
        if once != value {
            if let Ok(twice) = urlencoding::decode(&once) {
                if twice != once {
                    variants.push(twice.into_owned());
                }
            }
            variants.push(once.into_owned());
        }
    }
    variants
}
