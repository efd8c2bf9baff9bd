use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use strum::{Display, EnumString};
use tracing::info;

use crate::{config::ScrapeConfig, session::BrowserSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Capitalized form used in headings, e.g. `Easy`.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRecord {
    pub index: u32,
    pub title: String,
    pub difficulty: Difficulty,
    pub problem_url: String,
    pub locked: bool,
    /// Listing cells in header order, as written to the CSV.
    pub columns: Vec<String>,
}

/// The scraped problem table.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Listing column names followed by `problem_url` and `locked`.
    pub header: Vec<String>,
    pub problems: Vec<ProblemRecord>,
}

impl Listing {
    /// Problems of one difficulty in ascending index order.
    pub fn filter(&self, difficulty: Difficulty) -> Vec<&ProblemRecord> {
        let mut problems = self
            .problems
            .iter()
            .filter(|p| p.difficulty == difficulty)
            .collect::<Vec<_>>();
        problems.sort_by_key(|p| p.index);
        problems
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(&self.header)?;
        for problem in &self.problems {
            let locked = problem.locked.to_string();
            let record = problem
                .columns
                .iter()
                .map(String::as_str)
                .chain([problem.problem_url.as_str(), locked.as_str()]);
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Load the listing page with every problem shown and parse it.
pub async fn scrape_listing(session: &dyn BrowserSession, config: &ScrapeConfig) -> Result<Listing> {
    let selectors = &config.listing;
    let url = config.listing_url();
    session.goto(&url).await?;

    if !session
        .wait_for(&selectors.page_size_control, config.wait_timeout())
        .await?
    {
        return Err(anyhow!(
            "page size control {} not found on {url}",
            selectors.page_size_control
        ));
    }
    session
        .select_by_text(&selectors.page_size_control, &selectors.page_size_option)
        .await?;

    let html = session.page_source().await?;
    let listing = parse_listing(&html, config).with_context(|| format!("failed to parse {url}"))?;
    info!(count = listing.problems.len(), "scraped problems");
    Ok(listing)
}

pub fn parse_listing(html: &str, config: &ScrapeConfig) -> Result<Listing> {
    let selectors = &config.listing;
    let document = Html::parse_document(html);
    let table = document
        .select(&selector(&selectors.table)?)
        .next()
        .ok_or_else(|| anyhow!("No problem table found"))?;

    let header_cells = table
        .select(&selector(&selectors.header_cells)?)
        .map(|th| text_of(&th).to_lowercase())
        .collect::<Vec<_>>();
    let columns = inner(&header_cells).to_vec();
    let position = |name: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| anyhow!("No {name} column found"))
    };
    let index_idx = position("#")?;
    let title_idx = position("title")?;
    let difficulty_idx = position("difficulty")?;
    let solution_idx = columns.iter().position(|c| c == "solution");

    let cell_selector = selector(&selectors.cells)?;
    let link_selector = selector(&selectors.title_link)?;
    let lock_selector = selector(&selectors.lock_icon)?;

    let mut problems = vec![];
    for tr in table.select(&selector(&selectors.rows)?) {
        let tds = tr.select(&cell_selector).collect::<Vec<_>>();
        if tds.len() < columns.len() + 2 {
            continue;
        }
        let tds = &inner(&tds)[..columns.len()];

        let mut row = Vec::with_capacity(columns.len());
        for (i, td) in tds.iter().enumerate() {
            if Some(i) == solution_idx {
                let href = td
                    .select(&link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href"));
                row.push(href.map(|h| absolute(&config.base_url, h)).unwrap_or_default());
            } else {
                row.push(text_of(td));
            }
        }

        let title_cell = tds[title_idx];
        let href = title_cell
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| anyhow!("No problem link for {}", row[title_idx]))?;
        let mut problem_url = absolute(&config.base_url, href);
        if !problem_url.ends_with("/description") {
            problem_url.push_str("/description");
        }

        let index = row[index_idx]
            .parse::<u32>()
            .ok()
            .filter(|i| *i > 0)
            .ok_or_else(|| anyhow!("Invalid problem number {:?}", row[index_idx]))?;
        let difficulty = row[difficulty_idx]
            .parse::<Difficulty>()
            .with_context(|| format!("Invalid difficulty {:?}", row[difficulty_idx]))?;

        problems.push(ProblemRecord {
            index,
            title: row[title_idx].clone(),
            difficulty,
            problem_url,
            locked: title_cell.select(&lock_selector).next().is_some(),
            columns: row,
        });
    }

    let mut header = columns;
    header.extend(["problem_url".to_string(), "locked".to_string()]);
    Ok(Listing { header, problems })
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css}: {e}"))
}

/// Everything but the first and last entry.
fn inner<T>(items: &[T]) -> &[T] {
    match items.len() {
        0..=2 => &[],
        n => &items[1..n - 1],
    }
}

fn text_of(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn absolute(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{base}{href}")
    }
}
