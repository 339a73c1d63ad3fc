//! CMS document checks.

use std::path::Path;

use chrono::Datelike;
use funnels_storefront::cms::{LandingPage, build_sections, parse_landing_page};
use tracing::info;

/// One line of the section listing.
#[derive(Debug, PartialEq, Eq)]
pub struct SectionSummary {
    pub id: String,
    pub kind: String,
}

/// Sections the page would render, in order.
#[must_use]
pub fn summarize(page: &LandingPage) -> Vec<SectionSummary> {
    build_sections(page, chrono::Utc::now().year())
        .iter()
        .map(|section| SectionSummary {
            id: section.id(),
            kind: section.view.kind().to_string(),
        })
        .collect()
}

/// Validate a CMS document and list the sections it renders.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub fn validate(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let page = parse_landing_page(&raw).map_err(|e| format!("Invalid CMS document: {e}"))?;

    info!(
        title = %page.page.title,
        version = %page.version,
        language = %page.page.language,
        "CMS document is valid"
    );

    let sections = summarize(&page);
    for section in &sections {
        info!(id = %section.id, kind = %section.kind, "Section");
    }

    let skipped = page.components.len().saturating_sub(sections.len());
    if skipped > 0 {
        info!(skipped, "Disabled components not rendered");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_enabled_sections_in_order() {
        let page = parse_landing_page(
            r#"{
                "page": {"title": "Board - Pro"},
                "messaging": {
                    "mainPromise": "p", "mainBenefit": "b", "pricePosition": "pp",
                    "audience": "a", "toneOfVoice": "t", "keyObjections": []
                },
                "listicle": {"formatDescription": "f", "itemCount": 2, "orderingLogic": "o"},
                "components": [
                    {"type": "hero", "content": {"headline": "Ride"}},
                    {"type": "faq", "enabled": false, "content": {}},
                    {"type": "comparison", "content": {"headline": "Compare"}}
                ]
            }"#,
        )
        .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(
            summarize(&page),
            vec![
                SectionSummary {
                    id: "section-0".to_string(),
                    kind: "hero".to_string()
                },
                SectionSummary {
                    id: "section-1".to_string(),
                    kind: "comparison".to_string()
                },
            ]
        );
    }
}
