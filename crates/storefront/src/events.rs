//! Page events shared between cart components.
//!
//! Components announce cart changes and drawer requests as [`PageEvent`]s.
//! In-process listeners receive them over a `tokio::sync::broadcast` channel;
//! the browser receives the events emitted while handling a request through
//! the `HX-Trigger` response header, where `htmx` re-dispatches them as DOM
//! events with the same names.

use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::HeaderValue;
use axum::response::{IntoResponseParts, ResponseParts};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::shopify::Cart;

/// Response header htmx turns into client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";

const CHANNEL_CAPACITY: usize = 32;

/// An event dispatched on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// The cart changed. Carries the new cart when known; listeners refetch
    /// when it is absent.
    CartUpdated(Option<Box<Cart>>),
    /// Open the cart drawer.
    OpenCart,
    /// Toggle the cart drawer.
    ToggleCart,
    /// The consent API finished loading.
    AnalyticsReady,
}

impl PageEvent {
    /// DOM event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CartUpdated(_) => "cart-updated",
            Self::OpenCart => "open-cart",
            Self::ToggleCart => "toggle-cart",
            Self::AnalyticsReady => "shopify-analytics-ready",
        }
    }

    /// Event detail as JSON; `null` when the event carries none.
    #[must_use]
    pub fn detail(&self) -> Value {
        match self {
            Self::CartUpdated(Some(cart)) => serde_json::to_value(cart).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

/// Broadcast bus for one page render or request.
///
/// Cheap to clone; clones share the channel and the emitted list.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PageEvent>,
    emitted: Arc<Mutex<Vec<PageEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            emitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Dispatch an event to listeners and record it for the response.
    pub fn emit(&self, event: PageEvent) {
        tracing::debug!(event = event.name(), "Page event");
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        // No listeners is fine
        let _ = self.sender.send(event);
    }

    /// Listen for events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }

    /// Events emitted so far, in order.
    #[must_use]
    pub fn emitted(&self) -> Vec<PageEvent> {
        self.emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `HX-Trigger` value for the emitted events, or `None` if there are none.
    ///
    /// A later event with the same name replaces an earlier one, matching
    /// how a JSON object holds keys.
    #[must_use]
    pub fn hx_trigger(&self) -> Option<String> {
        let events = self.emitted();
        if events.is_empty() {
            return None;
        }

        let mut object = Map::new();
        for event in &events {
            object.insert(event.name().to_string(), event.detail());
        }
        serde_json::to_string(&Value::Object(object))
            .ok()
            .map(|json| escape_non_ascii(&json))
    }
}

/// Escape non-ASCII characters as `\uXXXX` so the JSON fits in a header.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

impl IntoResponseParts for EventBus {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(trigger) = self.hx_trigger() {
            match HeaderValue::from_str(&trigger) {
                Ok(value) => {
                    res.headers_mut().insert(HX_TRIGGER, value);
                }
                Err(e) => tracing::warn!(error = %e, "Dropping unencodable HX-Trigger header"),
            }
        }
        Ok(res)
    }
}
