use anyhow::{anyhow, Context, Result};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    config::{CodeSource, DetailLayout, ScrapeConfig},
    listing::selector,
    session::BrowserSession,
};

/// Description and starter code of one problem. Empty means the problem is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedContent {
    pub description_html: String,
    pub reference_code: String,
}

impl ScrapedContent {
    pub fn is_unavailable(&self) -> bool {
        self.description_html.is_empty()
    }
}

/// Scrape a problem page.
///
/// Returns empty content when the page offers no way to pick the configured language.
/// Pages that match none of the configured layouts, or miss an element the
/// matched layout promises, are errors.
pub async fn scrape_detail(
    session: &dyn BrowserSession,
    url: &str,
    config: &ScrapeConfig,
) -> Result<ScrapedContent> {
    let timeout = config.wait_timeout();
    session.goto(url).await?;

    let layout = resolve_layout(session, &config.layouts, timeout)
        .await?
        .ok_or_else(|| anyhow!("No known page layout matched {url}"))?;
    debug!(layout = %layout.name, url, "resolved page layout");

    if let Some(busy) = &layout.busy {
        if !session.wait_until_gone(busy, timeout).await? {
            warn!(url, busy = %busy, "page still loading, reading it anyway");
        }
    }

    if !session.wait_for(&layout.language_control, timeout).await? {
        info!(url, "no language selector");
        return Ok(ScrapedContent::default());
    }
    session.click(&layout.language_control).await?;
    if !session
        .click_text(&layout.language_option_tag, &config.language)
        .await?
    {
        info!(url, language = %config.language, "language not offered");
        return Ok(ScrapedContent::default());
    }

    let html = session.page_source().await?;
    layout
        .extract(&html)
        .with_context(|| format!("failed to read {url} as a {} page", layout.name))
}

/// The first layout, in configured order, whose readiness marker appears.
async fn resolve_layout<'a>(
    session: &dyn BrowserSession,
    layouts: &'a [DetailLayout],
    timeout: Duration,
) -> Result<Option<&'a DetailLayout>> {
    for layout in layouts {
        if session.wait_for(&layout.ready, timeout).await? {
            return Ok(Some(layout));
        }
    }
    Ok(None)
}

impl DetailLayout {
    pub fn extract(&self, html: &str) -> Result<ScrapedContent> {
        let document = Html::parse_document(html);
        let container = document
            .select(&selector(&self.description)?)
            .next()
            .ok_or_else(|| anyhow!("No description container {}", self.description))?;
        let description_html = container
            .select(&selector("div")?)
            .next()
            .ok_or_else(|| anyhow!("No description in {}", self.description))?
            .inner_html();

        Ok(ScrapedContent {
            description_html,
            reference_code: self.code.extract(&document)?,
        })
    }
}

impl CodeSource {
    fn extract(&self, document: &Html) -> Result<String> {
        match self {
            CodeSource::TextArea { selector: css } => {
                let textarea = document
                    .select(&selector(css)?)
                    .next()
                    .ok_or_else(|| anyhow!("No code editor {css}"))?;
                Ok(textarea.text().collect::<String>().trim().to_string())
            }
            CodeSource::InputValue { selector: css } => document
                .select(&selector(css)?)
                .next()
                .and_then(|input| input.value().attr("value"))
                .map(str::to_string)
                .ok_or_else(|| anyhow!("No code value in {css}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::FakeSession;
    use std::fs;

    const URL: &str = "https://leetcode.com/problems/two-sum/description";

    async fn scrape(fixture: &str) -> Result<ScrapedContent> {
        let session = FakeSession::default()
            .with_page(URL, fs::read_to_string(fixture).unwrap());
        scrape_detail(&session, URL, &ScrapeConfig::default()).await
    }

    #[tokio::test]
    async fn classic_layout_should_read_textarea() {
        let content = scrape("fixtures/detail_classic.html").await.unwrap();

        assert!(content.description_html.starts_with("<p>Given an array of integers"));
        assert!(content.description_html.contains("<pre>"));
        assert_eq!(
            content.reference_code,
            "class Solution:\n    def twoSum(self, nums, target):"
        );
    }

    #[tokio::test]
    async fn modern_layout_should_read_input_value() {
        let content = scrape("fixtures/detail_modern.html").await.unwrap();

        assert!(content.description_html.starts_with("<p>Given a 32-bit signed integer"));
        assert_eq!(
            content.reference_code,
            "class Solution(object):\n    def reverse(self, x):\n        "
        );
    }

    #[tokio::test]
    async fn missing_language_should_yield_empty_content() {
        let content = scrape("fixtures/detail_no_python.html").await.unwrap();

        assert!(content.is_unavailable());
        assert_eq!(content, ScrapedContent::default());
    }

    #[tokio::test]
    async fn missing_language_control_should_yield_empty_content() {
        let html = r#"<html><body><div class="question-content"><div class="question-description__3U1T"><div><p>Subscribe to unlock.</p></div></div></div></body></html>"#;
        let session = FakeSession::default().with_page(URL, html);

        let content = scrape_detail(&session, URL, &ScrapeConfig::default()).await.unwrap();
        assert_eq!(content, ScrapedContent::default());
    }

    #[tokio::test]
    async fn modern_layout_without_python_should_yield_empty_content() {
        let html = fs::read_to_string("fixtures/detail_modern.html")
            .unwrap()
            .replace(r#"<li class="ant-select-dropdown-menu-item">Python</li>"#, "");
        assert!(!html.contains(">Python<"));
        let session = FakeSession::default().with_page(URL, html);

        let content = scrape_detail(&session, URL, &ScrapeConfig::default()).await.unwrap();
        assert!(content.is_unavailable());
        assert_eq!(content, ScrapedContent::default());
    }

    #[tokio::test]
    async fn lingering_loading_overlay_should_not_stop_the_scrape() {
        let html = fs::read_to_string("fixtures/detail_classic.html").unwrap().replace(
            r#"<div class="container">"#,
            r#"<div id="MathJax_Message">Loading [MathJax]/jax/output/HTML-CSS/jax.js</div><div class="container">"#,
        );
        let session = FakeSession::default().with_page(URL, html);

        let content = scrape_detail(&session, URL, &ScrapeConfig::default()).await.unwrap();
        assert!(content.description_html.starts_with("<p>Given an array of integers"));
        assert_eq!(
            content.reference_code,
            "class Solution:\n    def twoSum(self, nums, target):"
        );
    }

    #[tokio::test]
    async fn layout_classes_may_follow_other_classes() {
        let classic = r#"<div class="question-content"><div class="css-10o4wqw question-description__3U1T"><div><p>hi</p></div></div><textarea name="lc-codemirror">pass</textarea></div>"#;
        let content = DetailLayout::classic().extract(classic).unwrap();
        assert_eq!(content.description_html, "<p>hi</p>");
        assert_eq!(content.reference_code, "pass");

        let modern = r#"<div class="css-q9153a content__u3I1"><div><p>hey</p></div></div><input name="code" value="pass">"#;
        let session = FakeSession::default().with_page(URL, modern);
        session.goto(URL).await.unwrap();
        let layouts = [DetailLayout::classic(), DetailLayout::modern()];
        let layout = resolve_layout(&session, &layouts, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(layout.name, "modern");
        assert_eq!(layout.extract(modern).unwrap().description_html, "<p>hey</p>");
    }

    #[tokio::test]
    async fn unknown_layout_should_fail() {
        let session = FakeSession::default().with_page(URL, "<html><body><p>Oops</p></body></html>");
        let result = scrape_detail(&session, URL, &ScrapeConfig::default()).await;

        assert!(result.is_err());
    }

    #[test]
    fn extract_without_code_should_fail() {
        let html = r#"<div class="question-content"><div class="question-description__x"><div><p>hi</p></div></div></div>"#;

        assert!(DetailLayout::classic().extract(html).is_err());
    }

    #[tokio::test]
    async fn layouts_should_be_tried_in_configured_order() {
        let html = fs::read_to_string("fixtures/detail_modern.html").unwrap();
        let session = FakeSession::default().with_page(URL, html);
        session.goto(URL).await.unwrap();
        let layouts = [DetailLayout::classic(), DetailLayout::modern()];

        let layout = resolve_layout(&session, &layouts, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(layout.name, "modern");
    }
}
