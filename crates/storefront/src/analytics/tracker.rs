//! Page view tracking with deferral until consent is known.

use tracing::debug;

use super::{AnalyticsClient, BrowserParameters, ConsentSnapshot, PageType};
use crate::cookies::CookieJar;
use crate::events::{EventBus, PageEvent};

/// Marks a page view waiting for `shopify-analytics-ready`.
pub const PAGE_VIEW_COOKIE: &str = "funnels_pv";

const DEFERRED: &str = "deferred";

/// Sends one page view per page mount.
///
/// When the page renders before the privacy API has reported consent in
/// this session, the view is parked in a session cookie and sent by [`Self::ready`].
#[derive(Debug, Clone)]
pub struct PageViewTracker {
    client: AnalyticsClient,
    jar: CookieJar,
}

impl PageViewTracker {
    #[must_use]
    pub const fn new(client: AnalyticsClient, jar: CookieJar) -> Self {
        Self { client, jar }
    }

    /// Track a rendered page.
    ///
    /// Returns whether a page view was delivered now.
    pub async fn mount(&self, browser: &BrowserParameters, page_type: PageType) -> bool {
        match ConsentSnapshot::load_current(&self.jar) {
            Some(consent) => {
                self.client
                    .send_page_view(Some(&consent), browser, page_type)
                    .await
            }
            None => {
                debug!("Consent not yet reported this session; deferring page view");
                self.jar.set(PAGE_VIEW_COOKIE, DEFERRED, None);
                false
            }
        }
    }

    /// Handle the one-time `shopify-analytics-ready` signal.
    ///
    /// Records consent, re-emits the signal, and flushes a deferred page
    /// view. A second signal finds nothing deferred and sends nothing.
    pub async fn ready(
        &self,
        consent: &ConsentSnapshot,
        browser: &BrowserParameters,
        events: &EventBus,
    ) -> bool {
        consent.save(&self.jar);
        events.emit(PageEvent::AnalyticsReady);

        if self.jar.get(PAGE_VIEW_COOKIE).as_deref() != Some(DEFERRED) {
            return false;
        }
        self.jar.remove(PAGE_VIEW_COOKIE);

        self.client
            .send_page_view(Some(consent), browser, PageType::Home)
            .await
    }
}
