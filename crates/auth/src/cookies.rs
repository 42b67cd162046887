//! Cookie storage for the auth session.
//!
//! The session is stored as `base64-<base64url(json)>`. Values longer than
//! [`CHUNK_SIZE`] are split across `<name>.0`, `<name>.1`, ... and reassembled
//! on read. Plain JSON values (no prefix) are accepted on read for cookies
//! written by older clients.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::session::AuthSession;

/// Largest value stored in a single cookie before chunking kicks in.
pub const CHUNK_SIZE: usize = 3180;

const BASE64_PREFIX: &str = "base64-";

/// Default cookie lifetime (400 days, the browser maximum).
pub const DEFAULT_MAX_AGE: i64 = 400 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax    => write!(f, "Lax"),
            Self::None   => write!(f, "None"),
        }
    }
}

/// Attributes applied to every auth cookie the service writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub max_age: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".into(),
            max_age: DEFAULT_MAX_AGE,
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

// ---------------------------------------------------------------------------
// SetCookie
// ---------------------------------------------------------------------------

/// One cookie to be written onto the outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl SetCookie {
    /// A cookie that deletes `name` in the browser, keeping the same attributes.
    pub fn removal(name: impl Into<String>, options: &CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            options: CookieOptions {
                max_age: 0,
                ..options.clone()
            },
        }
    }

    pub fn is_removal(&self) -> bool {
        self.options.max_age == 0
    }

    /// Render as a `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let o = &self.options;
        let mut out = format!(
            "{}={}; Path={}; Max-Age={}",
            self.name, self.value, o.path, o.max_age
        );
        if o.http_only {
            out.push_str("; HttpOnly");
        }
        if o.secure {
            out.push_str("; Secure");
        }
        out.push_str(&format!("; SameSite={}", o.same_site));
        out
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Parse a `Cookie` request header into name → value pairs.
///
/// Pairs without `=` are skipped; later duplicates win.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.trim().trim_matches('"').to_owned()))
        })
        .collect()
}

/// Names of every cookie holding (part of) the value stored under `name`.
pub fn stored_names(cookies: &BTreeMap<String, String>, name: &str) -> Vec<String> {
    cookies
        .keys()
        .filter(|k| {
            *k == name
                || k.strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
        })
        .cloned()
        .collect()
}

/// Reassemble the value stored under `name`, chunked or not.
pub fn read_chunked(cookies: &BTreeMap<String, String>, name: &str) -> Option<String> {
    if let Some(v) = cookies.get(name) {
        return Some(v.clone());
    }

    let mut out = String::new();
    for idx in 0.. {
        match cookies.get(&format!("{name}.{idx}")) {
            Some(part) => out.push_str(part),
            None if idx == 0 => return None,
            None => break,
        }
    }
    Some(out)
}

/// Decode a stored session value.
pub fn decode_session(raw: &str) -> Option<AuthSession> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => raw.to_owned(),
    };
    serde_json::from_str(&json).ok()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Encode a session for cookie storage.
pub fn encode_session(session: &AuthSession) -> String {
    // AuthSession is plain data; serialization cannot fail.
    let json = serde_json::to_string(session).unwrap_or_default();
    format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
}

/// Cookies that store `value` under `name`, chunking when needed.
///
/// Any name in `existing` that the new layout does not overwrite is removed,
/// so a shrinking value never leaves stale chunks behind.
pub fn write_chunked(
    name: &str,
    value: &str,
    options: &CookieOptions,
    existing: &[String],
) -> Vec<SetCookie> {
    let mut out: Vec<SetCookie> = if value.len() <= CHUNK_SIZE {
        vec![SetCookie {
            name: name.to_owned(),
            value: value.to_owned(),
            options: options.clone(),
        }]
    } else {
        value
            .as_bytes()
            .chunks(CHUNK_SIZE)
            .enumerate()
            .map(|(idx, part)| SetCookie {
                name: format!("{name}.{idx}"),
                // Encoded values are ASCII, so byte chunks are valid UTF-8.
                value: String::from_utf8_lossy(part).into_owned(),
                options: options.clone(),
            })
            .collect()
    };

    let written: Vec<String> = out.iter().map(|c| c.name.clone()).collect();
    out.extend(
        existing
            .iter()
            .filter(|n| !written.contains(n))
            .map(|n| SetCookie::removal(n.clone(), options)),
    );
    out
}

/// Cookies removing every name in `existing`.
pub fn clear_all(existing: &[String], options: &CookieOptions) -> Vec<SetCookie> {
    existing
        .iter()
        .map(|n| SetCookie::removal(n.clone(), options))
        .collect()
}
