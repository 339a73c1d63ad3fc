//! Analytics readiness signal from the privacy banner.

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::analytics::{BrowserParameters, ConsentSnapshot};
use crate::cookies::CookieJar;
use crate::events::EventBus;
use crate::state::AppState;

/// Body posted once `loadBanner` resolves.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadySignal {
    #[serde(flatten)]
    pub consent: ConsentSnapshot,
    /// `document.referrer` of the page that sent the signal.
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub page_view_sent: bool,
}

/// Record consent and flush a page view deferred until now.
#[instrument(skip_all)]
pub async fn ready(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(signal): Json<ReadySignal>,
) -> impl IntoResponse {
    let browser = BrowserParameters::for_fragment(
        &jar,
        &headers,
        &state.config().base_url,
        signal.referrer.as_deref(),
    );
    let events = EventBus::new();
    let page_view_sent = state
        .page_views(&jar)
        .ready(&signal.consent, &browser, &events)
        .await;

    (jar, events, Json(ReadyResponse { page_view_sent }))
}
