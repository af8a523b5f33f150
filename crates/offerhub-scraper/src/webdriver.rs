//! WebDriver-backed [`SessionFactory`] built on `fantoccini`.
//!
//! Requires a running WebDriver server (chromedriver, geckodriver, or a
//! Selenium container) reachable at the configured URL. Chrome is asked to
//! run headless with the sandbox flags container hosts need.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};

use crate::error::SessionError;
use crate::session::{CardHandle, PageSession, SessionFactory};

const CHROME_ARGS: [&str; 4] = [
    "--headless=new",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

/// Opens headless browser sessions through a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverSessionFactory {
    webdriver_url: String,
}

impl WebDriverSessionFactory {
    #[must_use]
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }

    fn capabilities() -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": CHROME_ARGS }),
        );
        caps
    }
}

impl SessionFactory for WebDriverSessionFactory {
    type Session = WebDriverPage;

    async fn open(&self, url: &str, timeout: Duration) -> Result<WebDriverPage, SessionError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(Self::capabilities());
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        let navigation = match tokio::time::timeout(timeout, client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(SessionError::timeout("navigation", timeout)),
        };

        if let Err(err) = navigation {
            if let Err(close_err) = client.close().await {
                tracing::warn!(error = %close_err, "failed to close session after navigation error");
            }
            return Err(err);
        }

        tracing::debug!(url, "browser session navigated");
        Ok(WebDriverPage { client })
    }
}

/// A live WebDriver page.
pub struct WebDriverPage {
    client: Client,
}

impl PageSession for WebDriverPage {
    type Card = WebDriverCard;

    async fn scroll(&self, delta_px: i64) -> Result<(), SessionError> {
        self.client
            .execute("window.scrollBy(0, arguments[0]);", vec![json!(delta_px)])
            .await
            .map_err(|e| SessionError::Command(e.to_string()))?;
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<WebDriverCard>, SessionError> {
        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| SessionError::Command(e.to_string()))?;
        Ok(elements.into_iter().map(WebDriverCard).collect())
    }

    async fn close(self) -> Result<(), SessionError> {
        self.client
            .close()
            .await
            .map_err(|e| SessionError::Command(e.to_string()))
    }
}

/// A rendered card element on a [`WebDriverPage`].
pub struct WebDriverCard(Element);

impl CardHandle for WebDriverCard {
    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.0
            .attr(name)
            .await
            .map_err(|e| SessionError::Command(e.to_string()))
    }
}
