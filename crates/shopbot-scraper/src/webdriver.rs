//! [`BrowsingSession`] backed by a WebDriver endpoint (geckodriver) via `fantoccini`.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator as WdLocator};
use serde_json::{json, Map, Value};
use shopbot_core::{Locator, SiteProfile};
use tokio::time::Instant;

use crate::error::SessionError;
use crate::session::{BrowsingSession, SessionFactory};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Extra time the client-side guard allows on top of the driver's own
/// `pageLoad` timeout, so the driver reports first.
const NAVIGATION_GRACE: Duration = Duration::from_secs(5);

/// Opens headless Firefox sessions with image loading disabled.
#[derive(Debug, Clone)]
pub struct WebDriverSessionFactory {
    endpoint: String,
    headless: bool,
    page_load_timeout: Duration,
}

impl WebDriverSessionFactory {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, headless: bool, page_load_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            headless,
            page_load_timeout,
        }
    }

    fn capabilities(&self) -> Map<String, Value> {
        let args: Vec<&str> = if self.headless {
            vec!["-headless"]
        } else {
            Vec::new()
        };
        let page_load_ms = u64::try_from(self.page_load_timeout.as_millis()).unwrap_or(u64::MAX);

        let mut caps = Map::new();
        caps.insert("browserName".to_owned(), json!("firefox"));
        caps.insert(
            "moz:firefoxOptions".to_owned(),
            json!({
                "args": args,
                "prefs": { "permissions.default.image": 2 }
            }),
        );
        caps.insert("timeouts".to_owned(), json!({ "pageLoad": page_load_ms }));
        caps
    }
}

impl SessionFactory for WebDriverSessionFactory {
    type Session = WebDriverSession;

    async fn open_session(&self, profile: &SiteProfile) -> Result<WebDriverSession, SessionError> {
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.endpoint)
            .await
            .map_err(|e| SessionError::Connect {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            store = %profile.store_id,
            endpoint = %self.endpoint,
            headless = self.headless,
            "browser session started"
        );

        Ok(WebDriverSession {
            client,
            page_load_timeout: self.page_load_timeout,
        })
    }
}

pub struct WebDriverSession {
    client: Client,
    page_load_timeout: Duration,
}

/// Owned form of a [`Locator`] that can lend out a `fantoccini` locator.
///
/// Class locators become compound CSS selectors (`"a b"` → `".a.b"`) so that
/// multi-class names keep matching elements that carry every class.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    Id(String),
    Css(String),
    XPath(String),
}

impl Query {
    fn as_wd(&self) -> WdLocator<'_> {
        match self {
            Query::Id(v) => WdLocator::Id(v),
            Query::Css(v) => WdLocator::Css(v),
            Query::XPath(v) => WdLocator::XPath(v),
        }
    }
}

impl From<&Locator> for Query {
    fn from(locator: &Locator) -> Self {
        match locator {
            Locator::Id(v) => Query::Id(v.clone()),
            Locator::Class(v) => Query::Css(class_selector(v)),
            Locator::Css(v) => Query::Css(v.clone()),
            Locator::XPath(v) => Query::XPath(v.clone()),
        }
    }
}

fn class_selector(classes: &str) -> String {
    classes
        .split_whitespace()
        .map(|class| format!(".{class}"))
        .collect()
}

fn navigation_error(url: &str, page_load_timeout: Duration, err: &CmdError) -> SessionError {
    if err.is_timeout() {
        SessionError::NavigationTimeout {
            url: url.to_owned(),
            timeout_secs: page_load_timeout.as_secs(),
        }
    } else {
        SessionError::Navigation {
            url: url.to_owned(),
            reason: err.to_string(),
        }
    }
}

fn command_error(err: &impl std::fmt::Display) -> SessionError {
    SessionError::Command(err.to_string())
}

impl BrowsingSession for WebDriverSession {
    type Element = Element;

    async fn open(&mut self, url: &str) -> Result<(), SessionError> {
        let guard = self.page_load_timeout.saturating_add(NAVIGATION_GRACE);
        match tokio::time::timeout(guard, self.client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(navigation_error(url, self.page_load_timeout, &e)),
            Err(_) => Err(SessionError::NavigationTimeout {
                url: url.to_owned(),
                timeout_secs: self.page_load_timeout.as_secs(),
            }),
        }
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<Element, SessionError> {
        let query = Query::from(locator);
        self.client.find(query.as_wd()).await.map_err(|e| {
            tracing::debug!(locator = %locator, error = %e, "element lookup failed");
            SessionError::ElementNotFound {
                locator: locator.to_string(),
            }
        })
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Element, SessionError> {
        let query = Query::from(locator);
        let deadline = Instant::now() + timeout;
        loop {
            match self.client.find(query.as_wd()).await {
                Ok(element) => return Ok(element),
                Err(e) if Instant::now() >= deadline => {
                    tracing::debug!(locator = %locator, error = %e, "gave up waiting for element");
                    return Err(SessionError::WaitTimeout {
                        locator: locator.to_string(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }

    async fn element_text(&mut self, element: &Element) -> Result<String, SessionError> {
        element.text().await.map_err(|e| command_error(&e))
    }

    async fn click(&mut self, element: &Element) -> Result<(), SessionError> {
        element.click().await.map_err(|e| command_error(&e))
    }

    async fn send_keys(&mut self, element: &Element, keys: &str) -> Result<(), SessionError> {
        element.send_keys(keys).await.map_err(|e| command_error(&e))
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| command_error(&e))
    }

    async fn page_title(&mut self) -> Result<String, SessionError> {
        self.client.title().await.map_err(|e| command_error(&e))
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        self.client.source().await.map_err(|e| command_error(&e))
    }

    async fn close(self) -> Result<(), SessionError> {
        self.client.close().await.map_err(|e| command_error(&e))
    }
}
