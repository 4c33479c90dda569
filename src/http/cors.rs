//! CORS decoration from a user-editable allow-list.
//!
//! # Responsibilities
//! - Parse the newline-separated `cors_host` setting into an allow-list
//! - Match the request Origin against the list
//! - Attach `Access-Control-Allow-Origin` / `Access-Control-Allow-Headers`
//!
//! # Design Decisions
//! - Origins and entries are normalized identically (trim, strip one
//!   trailing slash) before any comparison, so cosmetic differences never
//!   cause a false negative
//! - Matching is exact and case-sensitive; the only wildcard is a literal `*`
//! - A blank setting adds no headers at all (fail closed; the browser then
//!   blocks cross-origin access)
//! - Unmatched origins fall back to the first configured host, keeping a
//!   pre-multi-origin single-host setup working after an upgrade

use axum::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
};

/// Trim surrounding whitespace and strip at most one trailing slash.
///
/// Applied to allow-list entries and request origins alike. Idempotent on an
/// already-normalized host.
pub fn normalize_host(host: &str) -> &str {
    let trimmed = host.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed)
}

/// One configured host, keeping the user's spelling next to the normalized
/// form used for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AllowedHost {
    original: String,
    normalized: String,
}

/// The ordered allow-list parsed from the `cors_host` setting.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    hosts: Vec<AllowedHost>,
}

impl AllowList {
    /// Parse a newline-separated configuration string.
    ///
    /// Entries that normalize to nothing are dropped; the literal `*`
    /// survives. `\r\n` line endings are covered by the whitespace trim.
    pub fn parse(raw: &str) -> Self {
        let hosts = raw
            .split('\n')
            .map(|line| AllowedHost {
                original: line.trim().to_string(),
                normalized: normalize_host(line).to_string(),
            })
            .filter(|host| !host.normalized.is_empty())
            .collect();
        Self { hosts }
    }

    /// True when no usable entry survived parsing.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Decide the `Access-Control-Allow-Origin` value for a request, if any.
    ///
    /// First matching rule wins:
    /// 1. A literal `*` anywhere in the list allows every origin.
    /// 2. An exact normalized match echoes the origin exactly as the client
    ///    sent it.
    /// 3. Anything else falls back to the first configured host.
    pub fn resolve(&self, origin: Option<&str>) -> Option<String> {
        if self.hosts.iter().any(|host| host.normalized == "*") {
            return Some("*".to_string());
        }

        // An absent Origin header behaves as the empty string, which can
        // never match: empty entries were filtered out above.
        let origin = origin.unwrap_or("");
        let normalized_origin = normalize_host(origin);
        if !normalized_origin.is_empty()
            && self
                .hosts
                .iter()
                .any(|host| host.normalized == normalized_origin)
        {
            return Some(origin.to_string());
        }

        // Empty list: nothing usable was configured, add no header rather
        // than faulting.
        self.hosts.first().map(|host| host.original.clone())
    }
}

/// Decorate a response with CORS headers according to the allow-list policy.
///
/// `raw_config` is the untouched `cors_host` setting; a blank value adds no
/// headers. Every grant also sets `Access-Control-Allow-Headers: *`.
pub fn apply_cors_headers(headers: &mut HeaderMap, raw_config: &str, origin: Option<&str>) {
    if raw_config.trim().is_empty() {
        return;
    }

    let allow_list = AllowList::parse(raw_config);
    let Some(allow_origin) = allow_list.resolve(origin) else {
        return;
    };

    match HeaderValue::from_str(&allow_origin) {
        Ok(value) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        }
        Err(_) => {
            tracing::warn!(
                allow_origin = %allow_origin,
                "Configured host is not a valid header value, skipping CORS headers"
            );
        }
    }
}
