use anyhow::{ensure, Context, Result};
use askama::Template;
use derive_builder::Builder;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    config::ScrapeConfig,
    detail::scrape_detail,
    format::{format_description, format_solution},
    listing::{scrape_listing, Difficulty},
    notebook::{append_problem, create_from_template, Notebook},
    session::BrowserSession,
    solution::{slug, SolutionFetcher},
};

#[derive(Debug, Builder)]
pub struct LeetcodeScraper {
    #[builder(default)]
    config: ScrapeConfig,
    difficulty: Difficulty,
    /// Stop before the first problem numbered above this.
    #[builder(default)]
    max_index: Option<u32>,
}

/// Markdown heading cell for one problem.
#[derive(Debug, Template)]
#[template(
    source = "---\n## [{{ index }}. {{ title }} ({{ difficulty }})]({{ url }})\n{{ description }}",
    ext = "md",
    escape = "none"
)]
pub struct ProblemSummary<'a> {
    pub index: u32,
    pub title: &'a str,
    pub difficulty: &'a str,
    pub url: &'a str,
    pub description: &'a str,
}

/// An inclusive block of problem numbers `[width * k + 1, width * k + width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: u32,
    pub end: u32,
}

/// Tracks the current output range; only ever moves forward.
#[derive(Debug)]
pub struct RangeCursor {
    width: u32,
    current: Option<IndexRange>,
}

/// The notebook pair written for one difficulty and range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDocuments {
    pub problems: PathBuf,
    pub solutions: PathBuf,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<u32>,
    pub skipped_locked: Vec<u32>,
    pub skipped_unavailable: Vec<u32>,
    pub documents: Vec<PathBuf>,
}

impl LeetcodeScraper {
    pub async fn run(&self, session: &dyn BrowserSession) -> Result<RunSummary> {
        let config = &self.config;
        ensure!(config.range_width > 0, "range_width must be positive");

        let template = Notebook::template(config.template.as_deref())?;
        let fetcher = SolutionFetcher::new(config)?;

        let listing = scrape_listing(session, config).await?;
        listing
            .write_csv(&config.csv_path)
            .with_context(|| format!("failed to write {}", config.csv_path.display()))?;

        let mut summary = RunSummary::default();
        let mut cursor = RangeCursor::new(config.range_width);
        for problem in listing.filter(self.difficulty) {
            let index = problem.index;
            if self.max_index.is_some_and(|max| index > max) {
                break;
            }
            info!(index, title = %problem.title, url = %problem.problem_url, "problem");

            let (range, entered) = cursor.advance(index);
            let documents = RangeDocuments::new(&config.output_dir, self.difficulty, range);
            if entered {
                info!(start = range.start, end = range.end, "new notebooks");
                create_from_template(&documents.problems, &template)?;
                create_from_template(&documents.solutions, &template)?;
                summary.documents.push(documents.problems.clone());
                summary.documents.push(documents.solutions.clone());
            }

            if problem.locked {
                info!(index, "locked, skipping");
                summary.skipped_locked.push(index);
                continue;
            }

            let content = scrape_detail(session, &problem.problem_url, config)
                .await
                .with_context(|| format!("failed to scrape problem {index}. {}", problem.title))?;
            if content.is_unavailable() {
                summary.skipped_unavailable.push(index);
                continue;
            }

            let description = format_description(&content.description_html);
            let solution = format_solution(&fetcher.fetch(&slug(&problem.title)).await);
            let heading = ProblemSummary {
                index,
                title: &problem.title,
                difficulty: problem.difficulty.label(),
                url: &problem.problem_url,
                description: &description,
            }
            .render()?;

            append_problem(&documents.problems, &template, &heading, &content.reference_code)?;
            append_problem(&documents.solutions, &template, &heading, &solution)?;
            summary.processed.push(index);
        }

        Ok(summary)
    }
}

impl IndexRange {
    /// Ranges at the top of the `u32` space end at `u32::MAX`.
    pub fn containing(index: u32, width: u32) -> Self {
        let width = width.max(1);
        let start = (index.max(1) - 1) / width * width + 1;
        Self {
            start,
            end: start.saturating_add(width - 1),
        }
    }
}

impl RangeCursor {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            current: None,
        }
    }

    /// The range `index` is written to, and whether it was entered just now.
    ///
    /// Indices are expected in ascending order; an index behind the current
    /// range stays in the current range.
    pub fn advance(&mut self, index: u32) -> (IndexRange, bool) {
        match self.current {
            Some(range) if index <= range.end => (range, false),
            _ => {
                let range = IndexRange::containing(index, self.width);
                self.current = Some(range);
                (range, true)
            }
        }
    }
}

impl RangeDocuments {
    pub fn new(dir: &Path, difficulty: Difficulty, range: IndexRange) -> Self {
        let stem = format!("leetcode_{}_{:03}-{}", difficulty, range.start, range.end);
        Self {
            problems: dir.join(format!("{stem}.ipynb")),
            solutions: dir.join(format!("{stem}_sol.ipynb")),
        }
    }
}
