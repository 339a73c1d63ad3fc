//! Landing page document schema.
//!
//! One JSON document carries the page copy and the intent behind it. Objects
//! reject unknown keys except component `content` (open-ended) and content
//! `items` (extra keys ignored). `type` is free-form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_version() -> String {
    "1.0".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

const fn default_enabled() -> bool {
    true
}

/// The whole landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandingPage {
    #[serde(default = "default_version")]
    pub version: String,
    pub page: PageMeta,
    pub messaging: Messaging,
    pub listicle: ListicleStrategy,
    /// Top-level sections in render order; at least one.
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageMeta {
    pub title: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Page-wide messaging decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Messaging {
    pub main_promise: String,
    pub main_benefit: String,
    pub price_position: String,
    pub audience: String,
    pub tone_of_voice: String,
    pub key_objections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ListicleStrategy {
    pub format_description: String,
    pub item_count: i64,
    pub ordering_logic: String,
}

/// A section or sub-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_intent: Option<LayoutIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_intent: Option<StyleIntent>,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Instructions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LayoutIntent {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsive_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StyleIntent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography: Option<Typography>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_intent: Option<ColorIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagery_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders_and_shadows_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_notes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Typography {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ColorIntent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_usage: Option<String>,
}

/// Not rendered; guidance for whoever generates the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Instructions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_notes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_notes: Option<Vec<String>>,
}

// =============================================================================
// Content
// =============================================================================

/// Renderable copy. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageAsset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctas: Option<Vec<Cta>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ContentItem>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Content {
    #[must_use]
    pub fn images(&self) -> &[ImageAsset] {
        self.images.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn ctas(&self) -> &[Cta] {
        self.ctas.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        self.items.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn bullets(&self) -> &[String] {
        self.bullets.as_deref().unwrap_or_default()
    }
}

/// A plain string or a `{format, value}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Rich(RichText),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RichText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub value: String,
}

impl Text {
    /// The text without formatting information.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Rich(rich) => &rich.value,
        }
    }

    /// Whether the value is markdown.
    #[must_use]
    pub fn is_markdown(&self) -> bool {
        matches!(self, Self::Rich(RichText { format: Some(format), .. }) if format.eq_ignore_ascii_case("markdown"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageAsset {
    pub url: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Cta {
    pub label: String,
    /// e.g. `add_to_cart`, `open_cart`, `checkout`, `scroll_to:faq`, `link:https://...`
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_text: Option<String>,
}

/// A listicle entry, feature card, testimonial or FAQ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<Cta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
}

// =============================================================================
// Validation
// =============================================================================

/// Parse and validate a document.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn parse_landing_page(json: &str) -> Result<LandingPage, String> {
    let page: LandingPage = serde_json::from_str(json).map_err(|e| e.to_string())?;
    validate(&page)?;
    Ok(page)
}

/// Check what deserialization cannot.
///
/// # Errors
///
/// Returns a description of the violated constraint.
pub fn validate(page: &LandingPage) -> Result<(), String> {
    if page.components.is_empty() {
        return Err("components: must contain at least 1 component".to_string());
    }
    Ok(())
}
