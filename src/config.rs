use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;

/// Everything the scraper needs to know about the target site and the output layout.
///
/// Every field has a default, so a config file only needs to name what it overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub listing_path: String,
    /// Prefix of the reference solution files; `<slug>.py` is appended.
    pub solutions_url: String,
    pub language: String,
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub http_timeout_secs: u64,
    pub range_width: u32,
    pub output_dir: PathBuf,
    pub template: Option<PathBuf>,
    pub csv_path: PathBuf,
    pub listing: ListingSelectors,
    /// Tried in order; the first layout whose `ready` marker shows up wins.
    pub layouts: Vec<DetailLayout>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    pub page_size_control: String,
    pub page_size_option: String,
    pub table: String,
    pub header_cells: String,
    pub rows: String,
    pub cells: String,
    pub title_link: String,
    pub lock_icon: String,
}

/// One version of the problem detail page markup.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailLayout {
    pub name: String,
    pub ready: String,
    /// Loading overlay that has to disappear before the DOM is read.
    #[serde(default)]
    pub busy: Option<String>,
    pub language_control: String,
    pub language_option_tag: String,
    /// Container whose first nested `div` holds the problem statement.
    ///
    /// `[class^=..]` only tests the start of the whole attribute; pair it with
    /// `[class*=" .."]` to match a class token anywhere in the list.
    pub description: String,
    pub code: CodeSource,
}

/// Where the starter code lives on a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeSource {
    /// Text content of a `textarea`.
    TextArea { selector: String },
    /// `value` attribute of an `input`.
    InputValue { selector: String },
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://leetcode.com".to_string(),
            listing_path: "/problemset/all".to_string(),
            solutions_url: "https://raw.githubusercontent.com/kamyu104/LeetCode/master/Python/"
                .to_string(),
            language: "Python".to_string(),
            wait_timeout_secs: 3,
            poll_interval_ms: 250,
            http_timeout_secs: 10,
            range_width: 100,
            output_dir: PathBuf::from("notebooks"),
            template: None,
            csv_path: PathBuf::from("problems.csv"),
            listing: ListingSelectors::default(),
            layouts: vec![DetailLayout::classic(), DetailLayout::modern()],
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            page_size_control: "select.form-control".to_string(),
            page_size_option: "all".to_string(),
            table: "div.question-list-table".to_string(),
            header_cells: "thead th".to_string(),
            rows: "tbody tr".to_string(),
            cells: "td".to_string(),
            title_link: "a".to_string(),
            lock_icon: "i.fa-lock".to_string(),
        }
    }
}

impl DetailLayout {
    /// Page markup with a `Select-control` language picker and a CodeMirror textarea.
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            ready: ".question-content".to_string(),
            busy: Some("div#MathJax_Message".to_string()),
            language_control: "div.Select-control".to_string(),
            language_option_tag: "div".to_string(),
            description: r#"div[class^="question-description"], div[class*=" question-description"]"#
                .to_string(),
            code: CodeSource::TextArea {
                selector: r#"textarea[name="lc-codemirror"]"#.to_string(),
            },
        }
    }

    /// Page markup with an ant-design language picker and the code in a hidden input.
    pub fn modern() -> Self {
        Self {
            name: "modern".to_string(),
            ready: r#"div[class^="content__"], div[class*=" content__"]"#.to_string(),
            busy: Some("div#MathJax_Message".to_string()),
            language_control: "div.ant-select-selection-selected-value".to_string(),
            language_option_tag: "li".to_string(),
            description: r#"div[class^="content__"], div[class*=" content__"]"#.to_string(),
            code: CodeSource::InputValue {
                selector: r#"input[name="code"]"#.to_string(),
            },
        }
    }
}

impl ScrapeConfig {
    /// Load from a TOML file, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, self.listing_path)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
