//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{OriginalUri, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::Datelike;
use tracing::{instrument, warn};

use super::product::{VariantQuery, product_view};
use crate::analytics::{BrowserParameters, PageType};
use crate::cart::CartView;
use crate::cms::sections::Body;
use crate::cms::{Section, SectionView, build_sections};
use crate::cookies::CookieJar;
use crate::error::{AppError, Result};
use crate::filters;
use crate::product::ProductView;
use crate::state::AppState;

/// Title used when neither the CMS nor the product names the page.
const FALLBACK_TITLE: &str = "Shop";

/// Values the privacy banner is initialized with.
#[derive(Debug, Clone)]
pub struct PrivacyView {
    pub storefront_access_token: String,
    pub checkout_root_domain: String,
    pub storefront_root_domain: String,
}

impl PrivacyView {
    fn new(state: &AppState, page_url: &url::Url) -> Self {
        let shopify = &state.config().shopify;
        Self {
            storefront_access_token: shopify.public_token().to_string(),
            checkout_root_domain: shopify.store.clone(),
            storefront_root_domain: page_url.host_str().unwrap_or_default().to_string(),
        }
    }
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub title: String,
    pub language: String,
    pub sections: Vec<Section>,
    pub cms_error: Option<String>,
    pub product: Option<ProductView>,
    pub product_message: Option<&'static str>,
    pub cart: CartView,
    pub drawer_open: bool,
    pub privacy: PrivacyView,
}

/// Display the landing page.
///
/// CMS sections, the product and the visitor's cart load concurrently. A
/// CMS failure replaces the sections with its message; the rest of the
/// page still renders.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<VariantQuery>,
) -> Result<impl IntoResponse> {
    let page_url = state
        .base_url()
        .and_then(|base| base.join(&uri.to_string()))
        .map_err(|e| AppError::Internal(format!("Invalid page URL: {e}")))?;

    let store = state.cart_store(&jar);
    let (document, ()) = tokio::join!(state.cms().fetch(), store.mount());

    let year = chrono::Utc::now().year();
    let (title, language, sections, cms_error) = match document {
        Ok(page) => (
            Some(page.page.title.clone()),
            page.page.language.clone(),
            build_sections(&page, year),
            None,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to load CMS content");
            (None, "en".to_string(), Vec::new(), Some(e.to_string()))
        }
    };

    let (product, product_message) = product_view(state.product(), query.variant.as_deref());
    let title = title
        .filter(|t| !t.is_empty())
        .or_else(|| product.as_ref().map(|p| p.title.clone()))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let browser = BrowserParameters::for_page(&jar, &headers, &page_url);
    state.page_views(&jar).mount(&browser, PageType::Home).await;

    let template = HomeTemplate {
        title,
        language,
        sections,
        cms_error,
        product,
        product_message,
        cart: CartView::from(&store.state()),
        drawer_open: false,
        privacy: PrivacyView::new(&state, &page_url),
    };
    Ok((jar, template))
}

/// Liveness health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}
