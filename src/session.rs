use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::{components::SelectElement, prelude::*};
use tracing::debug;

/// The browser operations the scraper relies on.
///
/// A session is acquired once per run and passed by reference into every step.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn page_source(&self) -> Result<String>;

    /// Wait until an element matching `css` is present. `false` on timeout.
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool>;

    /// Wait until no displayed element matches `css`. `false` on timeout.
    async fn wait_until_gone(&self, css: &str, timeout: Duration) -> Result<bool>;

    async fn click(&self, css: &str) -> Result<()>;

    /// Click the first `tag` element whose text is exactly `text`. `false` if there is none.
    async fn click_text(&self, tag: &str, text: &str) -> Result<bool>;

    /// Pick an option by its visible text in the `<select>` matching `css`.
    async fn select_by_text(&self, css: &str, text: &str) -> Result<()>;
}

/// A [`BrowserSession`] backed by a WebDriver server (chromedriver, geckodriver, ...).
pub struct WebDriverSession {
    driver: WebDriver,
    poll_interval: Duration,
}

impl WebDriverSession {
    pub async fn connect(server_url: &str, headless: bool, poll_interval: Duration) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.set_headless()?;
        }
        let driver = WebDriver::new(server_url, caps)
            .await
            .with_context(|| format!("failed to start a browser session at {server_url}"))?;

        Ok(Self {
            driver,
            poll_interval,
        })
    }

    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "navigate");
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool> {
        let found = self
            .driver
            .query(By::Css(css))
            .wait(timeout, self.poll_interval)
            .exists()
            .await?;
        Ok(found)
    }

    async fn wait_until_gone(&self, css: &str, timeout: Duration) -> Result<bool> {
        let gone = self
            .driver
            .query(By::Css(css))
            .and_displayed()
            .wait(timeout, self.poll_interval)
            .not_exists()
            .await?;
        Ok(gone)
    }

    async fn click(&self, css: &str) -> Result<()> {
        self.driver.find(By::Css(css)).await?.click().await?;
        Ok(())
    }

    async fn click_text(&self, tag: &str, text: &str) -> Result<bool> {
        let xpath = format!("//{tag}[text()=\"{text}\"]");
        let elements = self.driver.find_all(By::XPath(xpath.as_str())).await?;
        match elements.first() {
            Some(element) => {
                element.click().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn select_by_text(&self, css: &str, text: &str) -> Result<()> {
        let element = self.driver.find(By::Css(css)).await?;
        SelectElement::new(&element)
            .await?
            .select_by_visible_text(text)
            .await?;
        Ok(())
    }
}
