//! Visitor consent as reported by Shopify's Customer Privacy API.
//!
//! The privacy banner runs in the browser. Once `loadBanner` resolves, the
//! page posts what `window.Shopify.customerPrivacy` reports to
//! `/analytics/ready`, and the snapshot is kept in a cookie so later requests
//! know whether analytics may be sent. No snapshot means the API has not
//! initialized yet, which denies everything.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cookies::CookieJar;

/// Cookie holding the last consent snapshot.
pub const CONSENT_COOKIE: &str = "funnels_consent";

/// Session cookie marking a snapshot reported during this browser session.
pub const CONSENT_SESSION_COOKIE: &str = "funnels_consent_session";

const CONSENT_COOKIE_DAYS: i64 = 30;

/// Permissions reported by the Customer Privacy API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsentSnapshot {
    /// `analyticsProcessingAllowed()`
    pub analytics: bool,
    /// `marketingAllowed()`
    pub marketing: bool,
    /// `preferencesProcessingAllowed()`
    pub preferences: bool,
    /// `saleOfDataAllowed()`
    pub sale_of_data: bool,
    /// `shouldShowBanner()`
    pub should_show_banner: bool,
    /// `getRegion()`, ISO 3166-2 without the dash (e.g. `USCA`).
    pub region: String,
}

/// Consent flags carried by every analytics payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsentFlags {
    pub has_user_consent: bool,
    pub analytics_allowed: bool,
    pub marketing_allowed: bool,
    pub sale_of_data_allowed: bool,
}

impl ConsentSnapshot {
    /// Read the snapshot stored for this visitor.
    ///
    /// A missing or malformed cookie reads as `None`.
    #[must_use]
    pub fn load(jar: &CookieJar) -> Option<Self> {
        let raw = jar.get(CONSENT_COOKIE)?;
        let json = urlencoding::decode(&raw).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Read the snapshot only if the banner reported it this session.
    ///
    /// A snapshot kept from an earlier visit may predate a revocation, so
    /// it does not count until the privacy API reports again.
    #[must_use]
    pub fn load_current(jar: &CookieJar) -> Option<Self> {
        jar.get(CONSENT_SESSION_COOKIE)?;
        Self::load(jar)
    }

    /// Store the snapshot for later requests and mark it current for this
    /// session.
    pub fn save(&self, jar: &CookieJar) {
        let Ok(json) = serde_json::to_string(self) else {
            return;
        };
        let expires = Utc::now() + Duration::days(CONSENT_COOKIE_DAYS);
        jar.set(CONSENT_COOKIE, &urlencoding::encode(&json), Some(expires));
        jar.set(CONSENT_SESSION_COOKIE, "1", None);
    }

    /// Payload flags. Sale of data is never reported as allowed.
    #[must_use]
    pub const fn flags(&self) -> ConsentFlags {
        ConsentFlags {
            has_user_consent: self.analytics,
            analytics_allowed: self.analytics,
            marketing_allowed: self.marketing,
            sale_of_data_allowed: false,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_survives_cookie_round_trip() {
        let jar = CookieJar::default();
        let consent = ConsentSnapshot {
            analytics: true,
            marketing: false,
            region: "USCA".to_string(),
            ..ConsentSnapshot::default()
        };
        consent.save(&jar);

        assert_eq!(ConsentSnapshot::load(&jar), Some(consent));
        assert!(jar.pending()[0].starts_with("funnels_consent=%7B"));
    }

    #[test]
    fn missing_or_garbled_cookie_is_none() {
        assert_eq!(ConsentSnapshot::load(&CookieJar::default()), None);
        let jar = CookieJar::from_cookie_header("funnels_consent=not-json");
        assert_eq!(ConsentSnapshot::load(&jar), None);
    }

    #[test]
    fn banner_payload_uses_camel_case() {
        let consent: ConsentSnapshot = serde_json::from_str(
            r#"{"analytics":true,"marketing":true,"saleOfData":true,"shouldShowBanner":false}"#,
        )
        .unwrap_or_default();
        assert!(consent.sale_of_data);
        assert!(consent.marketing);
        assert_eq!(consent.region, "");
    }

    #[test]
    fn flags_never_allow_sale_of_data() {
        let consent = ConsentSnapshot {
            analytics: true,
            marketing: true,
            sale_of_data: true,
            ..ConsentSnapshot::default()
        };
        let flags = consent.flags();
        assert!(flags.has_user_consent);
        assert!(flags.analytics_allowed);
        assert!(flags.marketing_allowed);
        assert!(!flags.sale_of_data_allowed);
    }

    #[test]
    fn snapshot_from_earlier_session_is_not_current() {
        let jar = CookieJar::from_cookie_header(
            "funnels_consent=%7B%22analytics%22%3Atrue%7D",
        );
        assert!(ConsentSnapshot::load(&jar).is_some_and(|c| c.analytics));
        assert_eq!(ConsentSnapshot::load_current(&jar), None);
    }

    #[test]
    fn saved_snapshot_is_current() {
        let jar = CookieJar::default();
        let consent = ConsentSnapshot {
            analytics: true,
            ..ConsentSnapshot::default()
        };
        consent.save(&jar);

        assert_eq!(ConsentSnapshot::load_current(&jar), Some(consent));
        assert!(
            jar.pending()
                .iter()
                .any(|c| c.starts_with("funnels_consent_session=1"))
        );
    }
}
