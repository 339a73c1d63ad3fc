//! Request-scoped cookie access and the cart-id cookie.
//!
//! [`CookieJar`] behaves like a browser's `document.cookie`: it starts from
//! the request `Cookie` header, reads reflect earlier writes made while
//! handling the same request, and every write is queued as a `Set-Cookie`
//! header on the response.
//!
//! [`CartCookie`] persists the Shopify cart id under a per-store name so that
//! several landing pages served from one domain keep separate carts.

use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;

/// Prefix of the per-store cart cookie name.
pub const CART_COOKIE_PREFIX: &str = "funnels_cart_";

/// Cart cookies match Shopify's own cart expiry.
pub const CART_COOKIE_DAYS: i64 = 10;

/// Date format used by the `expires` attribute.
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// `expires` value that deletes a cookie.
pub const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

// =============================================================================
// CookieJar
// =============================================================================

/// Cookies visible to the current request plus the writes made so far.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<JarInner>>,
}

#[derive(Debug, Default)]
struct JarInner {
    /// `name=value` pairs joined with `"; "`, as `document.cookie` shows them.
    pairs: Vec<(String, String)>,
    /// Serialized `Set-Cookie` values in write order.
    pending: Vec<String>,
}

impl CookieJar {
    /// Build a jar from a raw `Cookie` header value.
    #[must_use]
    pub fn from_cookie_header(raw: &str) -> Self {
        let pairs = raw
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
            })
            .collect();

        Self {
            inner: Arc::new(Mutex::new(JarInner {
                pairs,
                pending: Vec::new(),
            })),
        }
    }

    /// Build a jar from every `Cookie` header in a request.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let raw = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        Self::from_cookie_header(&raw)
    }

    /// The current cookie string, `document.cookie` style.
    #[must_use]
    pub fn raw(&self) -> String {
        let inner = self.lock();
        inner
            .pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Look up a cookie's raw (still encoded) value.
    ///
    /// Matches `(^| )name=([^;]+)` against the cookie string, so an empty
    /// value reads as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let pattern = format!("(^| ){}=([^;]+)", regex::escape(name));
        let re = Regex::new(&pattern).ok()?;
        re.captures(&self.raw())
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Write a cookie with `path=/; SameSite=Lax`.
    ///
    /// `expires` of `None` makes a session cookie. An expiry in the past
    /// removes the cookie from subsequent reads.
    pub fn set(&self, name: &str, value: &str, expires: Option<DateTime<Utc>>) {
        let mut header = format!("{name}={value}");
        if let Some(at) = expires {
            header.push_str("; expires=");
            header.push_str(&at.format(COOKIE_DATE_FORMAT).to_string());
        }
        header.push_str("; path=/; SameSite=Lax");

        let mut inner = self.lock();
        inner.pairs.retain(|(existing, _)| existing != name);
        if expires.is_none_or(|at| at > Utc::now()) {
            inner.pairs.push((name.to_string(), value.to_string()));
        }
        inner.pending.push(header);
    }

    /// Expire a cookie immediately.
    pub fn remove(&self, name: &str) {
        let mut inner = self.lock();
        inner.pairs.retain(|(existing, _)| existing != name);
        inner
            .pending
            .push(format!("{name}=; expires={EXPIRED}; path=/; SameSite=Lax"));
    }

    /// `Set-Cookie` values queued by this request.
    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        self.lock().pending.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JarInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> FromRequestParts<S> for CookieJar
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

impl IntoResponseParts for CookieJar {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for header in self.pending() {
            match HeaderValue::from_str(&header) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(error = %e, "Dropping unencodable Set-Cookie header"),
            }
        }
        Ok(res)
    }
}

// =============================================================================
// CartCookie
// =============================================================================

/// The store-scoped cookie holding the Shopify cart id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartCookie {
    name: String,
}

impl CartCookie {
    /// Cookie for a store; a missing or empty id uses `default`.
    ///
    /// The id is percent-encoded so names stay distinct per store and never
    /// contain `=` or `;`.
    #[must_use]
    pub fn for_store(store_id: Option<&str>) -> Self {
        let store = store_id.filter(|id| !id.is_empty()).unwrap_or("default");
        Self {
            name: format!("{CART_COOKIE_PREFIX}{}", urlencoding::encode(store)),
        }
    }

    /// The cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Persist a cart id for ten days.
    pub fn save(&self, jar: &CookieJar, cart_id: &str) {
        let expires = Utc::now() + Duration::days(CART_COOKIE_DAYS);
        jar.set(&self.name, &urlencoding::encode(cart_id), Some(expires));
    }

    /// The persisted cart id, if any.
    #[must_use]
    pub fn get(&self, jar: &CookieJar) -> Option<String> {
        let raw = jar.get(&self.name)?;
        let decoded = urlencoding::decode(&raw).map_or(raw.clone(), |d| d.into_owned());
        (!decoded.is_empty()).then_some(decoded)
    }

    /// Forget the cart.
    pub fn clear(&self, jar: &CookieJar) {
        jar.remove(&self.name);
    }
}
