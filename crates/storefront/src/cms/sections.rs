//! Section views built from a landing page document.
//!
//! Each enabled top-level component becomes one [`Section`], chosen by its
//! `type`. Unknown types fall back to a generic view. Templates render the
//! views; nothing here holds state.

use std::sync::LazyLock;

use comrak::{Options, markdown_to_html};
use regex::Regex;

use super::schema::{Component, Content, Cta, LandingPage, Messaging, Text};

/// Button label when a section has no CTA.
pub const DEFAULT_CTA_LABEL: &str = "Get Started";

/// Heading of the benefits section.
pub const BENEFITS_TITLE: &str = "Why Choose Us";

/// "Endorsement from Jane Doe, Pro Rider" → "Jane Doe"
static ENDORSER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)from\s+([^,]+)").expect("Invalid regex"));

// =============================================================================
// Views
// =============================================================================

/// Body copy ready for a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Rendered markdown; raw HTML in the source is dropped.
    Html(String),
    /// Plain text, escaped by the template.
    Plain(String),
}

impl From<&Text> for Body {
    fn from(text: &Text) -> Self {
        if text.is_markdown() {
            Self::Html(render_markdown(text.value()))
        } else {
            Self::Plain(text.value().to_string())
        }
    }
}

/// Render markdown with comrak's safe defaults.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    markdown_to_html(markdown, &options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtaView {
    pub label: String,
    pub href: String,
    pub supporting_text: Option<String>,
}

impl CtaView {
    /// The first CTA, or a default one pointing at the product.
    fn primary(ctas: &[Cta]) -> Self {
        ctas.first().map_or_else(
            || Self {
                label: DEFAULT_CTA_LABEL.to_string(),
                href: "#product".to_string(),
                supporting_text: None,
            },
            Self::from,
        )
    }
}

impl From<&Cta> for CtaView {
    fn from(cta: &Cta) -> Self {
        Self {
            label: cta.label.clone(),
            href: cta_href(&cta.action),
            supporting_text: cta.supporting_text.clone().filter(|t| !t.is_empty()),
        }
    }
}

/// Where a CTA action leads.
///
/// `link:<url>` and `scroll_to:<id>` are explicit; `checkout` goes to the
/// checkout redirect; everything else scrolls to the product.
#[must_use]
pub fn cta_href(action: &str) -> String {
    if let Some(url) = action.strip_prefix("link:") {
        return url.to_string();
    }
    if let Some(anchor) = action.strip_prefix("scroll_to:") {
        return format!("#{anchor}");
    }
    match action {
        "checkout" => "/checkout".to_string(),
        _ => "#product".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroView {
    pub headline: String,
    pub subheadline: Option<String>,
    pub background_url: Option<String>,
    pub cta: CtaView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureView {
    pub title: String,
    pub text: Option<Body>,
    pub image_url: Option<String>,
    pub image_alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturesView {
    pub headline: String,
    pub items: Vec<FeatureView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenefitsView {
    pub title: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonialView {
    pub name: String,
    pub initials: String,
    pub text: Option<Body>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonialsView {
    pub headline: String,
    pub body: Option<Body>,
    pub items: Vec<TestimonialView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: Option<Body>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqView {
    pub headline: String,
    pub items: Vec<FaqEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtaSectionView {
    pub headline: String,
    pub subheadline: Option<String>,
    pub cta: CtaView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterLink {
    pub text: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterView {
    pub year: i32,
    pub product_name: String,
    pub links: Vec<FooterLink>,
}

impl FooterView {
    /// `© 2026 Product. All rights reserved.`
    #[must_use]
    pub fn copyright(&self) -> String {
        format!("© {} {}. All rights reserved.", self.year, self.product_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericView {
    pub kind: String,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub body: Option<Body>,
    pub bullets: Vec<String>,
    pub ctas: Vec<CtaView>,
}

/// One rendered section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionView {
    Hero(HeroView),
    Features(FeaturesView),
    Benefits(BenefitsView),
    Testimonials(TestimonialsView),
    Faq(FaqView),
    Cta(CtaSectionView),
    Footer(FooterView),
    Generic(GenericView),
}

impl SectionView {
    /// Component type this view renders.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Hero(_) => "hero",
            Self::Features(_) => "features",
            Self::Benefits(_) => "benefits",
            Self::Testimonials(_) => "testimonials",
            Self::Faq(_) => "faq",
            Self::Cta(_) => "cta",
            Self::Footer(_) => "footer",
            Self::Generic(view) => &view.kind,
        }
    }
}

/// A section with its position on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub index: usize,
    pub view: SectionView,
}

impl Section {
    /// DOM id.
    #[must_use]
    pub fn id(&self) -> String {
        format!("section-{}", self.index)
    }
}

// =============================================================================
// Building
// =============================================================================

/// Views for the enabled top-level components, in document order.
#[must_use]
pub fn build_sections(page: &LandingPage, year: i32) -> Vec<Section> {
    page.components
        .iter()
        .filter(|component| component.enabled)
        .enumerate()
        .map(|(index, component)| Section {
            index,
            view: section_view(page, component, year),
        })
        .collect()
}

fn section_view(page: &LandingPage, component: &Component, year: i32) -> SectionView {
    let content = &component.content;
    match component.kind.as_str() {
        "hero" => SectionView::Hero(HeroView {
            headline: headline(content),
            subheadline: content.subheadline.clone(),
            background_url: content.images().first().map(|image| image.url.clone()),
            cta: CtaView::primary(content.ctas()),
        }),
        "features" => SectionView::Features(FeaturesView {
            headline: headline(content),
            items: content
                .items()
                .iter()
                .map(|item| FeatureView {
                    title: item.title.clone().unwrap_or_default(),
                    text: item.text.as_ref().map(Body::from),
                    image_url: item.image.as_ref().map(|image| image.url.clone()),
                    image_alt: item
                        .image
                        .as_ref()
                        .map(|image| image.alt.clone())
                        .unwrap_or_default(),
                })
                .collect(),
        }),
        "benefits" => SectionView::Benefits(BenefitsView {
            title: BENEFITS_TITLE.to_string(),
            benefits: benefits(&page.messaging),
        }),
        "testimonials" => SectionView::Testimonials(TestimonialsView {
            headline: headline(content),
            body: content.body.as_ref().map(Body::from),
            items: content
                .items()
                .iter()
                .map(|item| {
                    let name = endorser_name(item.title.as_deref().unwrap_or_default());
                    TestimonialView {
                        initials: initials(&name),
                        name,
                        text: item.text.as_ref().map(Body::from),
                        image_url: item.image.as_ref().map(|image| image.url.clone()),
                    }
                })
                .collect(),
        }),
        "faq" => SectionView::Faq(FaqView {
            headline: headline(content),
            items: content
                .items()
                .iter()
                .map(|item| FaqEntry {
                    question: item.title.clone().unwrap_or_default(),
                    answer: item.text.as_ref().map(Body::from),
                })
                .collect(),
        }),
        "cta" => SectionView::Cta(CtaSectionView {
            headline: headline(content),
            subheadline: content.subheadline.clone(),
            cta: CtaView::primary(content.ctas()),
        }),
        "footer" => SectionView::Footer(FooterView {
            year,
            product_name: product_name(&page.page.title).to_string(),
            links: vec![
                FooterLink {
                    text: "Privacy Policy",
                    url: "/privacy",
                },
                FooterLink {
                    text: "Terms of Service",
                    url: "/terms",
                },
                FooterLink {
                    text: "Contact",
                    url: "/contact",
                },
            ],
        }),
        other => SectionView::Generic(GenericView {
            kind: other.to_string(),
            headline: content.headline.clone(),
            subheadline: content.subheadline.clone(),
            body: content.body.as_ref().map(Body::from),
            bullets: content.bullets().to_vec(),
            ctas: content.ctas().iter().map(CtaView::from).collect(),
        }),
    }
}

fn headline(content: &Content) -> String {
    content.headline.clone().unwrap_or_default()
}

/// The four benefit bullets derived from page messaging.
#[must_use]
pub fn benefits(messaging: &Messaging) -> Vec<String> {
    vec![
        messaging.main_promise.clone(),
        format!("Designed for {}", messaging.audience.to_lowercase()),
        format!("{} at its finest", messaging.price_position),
        messaging.main_benefit.clone(),
    ]
}

/// The endorser named after "from", else the whole title.
#[must_use]
pub fn endorser_name(title: &str) -> String {
    ENDORSER_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map_or(title, |m| m.as_str())
        .trim()
        .to_string()
}

/// First letter of each space-separated word.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .collect()
}

/// Page title up to the first ` - `.
#[must_use]
pub fn product_name(title: &str) -> &str {
    title.split(" - ").next().unwrap_or(title)
}
