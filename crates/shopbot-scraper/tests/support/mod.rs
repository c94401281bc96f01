//! A scripted in-memory browser for exercising the orchestrator and
//! coordinator without a WebDriver endpoint.
//!
//! A [`FakeSite`] is a small state machine: the home page holds the search
//! input, submitting a query moves to the page scripted for that query, and
//! clicking the first result moves to the scripted product page. Element
//! lookups are keyed by the locator's config syntax (`"class:price"`).

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shopbot_core::{
    Locator, PriceRule, RunResults, SiteProfile, SiteRegistry, StoreId, SubmitAction, UrlRewrite,
};
use shopbot_scraper::{
    BrowsingSession, RunEvent, RunObserver, SearchSettings, SessionError, SessionFactory,
    ENTER_KEY,
};

pub const SEARCH_INPUT: &str = "id:search";
pub const FIRST_RESULT: &str = "xpath://div[@class='results']/a[1]";
pub const PROMO_PRICE: &str = "class:promo";
pub const PRICE: &str = "class:price";
pub const NAME: &str = "class:product-name";
pub const NO_RESULTS: &str = "No results found.";

pub fn store(id: &str) -> StoreId {
    id.parse().unwrap()
}

pub fn locator(raw: &str) -> Locator {
    raw.parse().unwrap()
}

pub fn base_url(id: &str) -> String {
    format!("https://{id}.shop.test/")
}

pub fn profile(id: &str) -> SiteProfile {
    SiteProfile {
        store_id: store(id),
        display_name: id.to_uppercase(),
        base_url: base_url(id),
        search_input: locator(SEARCH_INPUT),
        submit: SubmitAction::EnterKey,
        first_result: locator(FIRST_RESULT),
        price_locators: vec![locator(PROMO_PRICE), locator(PRICE)],
        name_locator: locator(NAME),
        title_separator: "|".to_owned(),
        price_rule: PriceRule::MinorUnits {
            currency: "R".to_owned(),
        },
        url_rewrite: UrlRewrite::ProductPath {
            marker: "/p/".to_owned(),
        },
        no_results_marker: Some(NO_RESULTS.to_owned()),
    }
}

pub fn registry(ids: &[&str]) -> SiteRegistry {
    SiteRegistry::new(ids.iter().map(|id| profile(id)).collect()).unwrap()
}

pub fn fast_settings() -> SearchSettings {
    SearchSettings {
        wait_timeout: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
    }
}

pub fn items(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

// -----------------------------------------------------------------------
// Pages and sites
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub url: String,
    pub title: String,
    pub source: String,
    pub elements: HashMap<String, String>,
}

impl FakePage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with(mut self, locator: &str, text: &str) -> Self {
        self.elements.insert(locator.to_owned(), text.to_owned());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_owned();
        self
    }

    /// A results list whose first entry leads on to the product page.
    pub fn results(store_id: &str) -> Self {
        Self::new(format!("{}search?q=x", base_url(store_id)))
            .titled("Search results")
            .with(FIRST_RESULT, "first result")
    }

    /// A product page at `<base>/<slug>/p/<code>?tracking`.
    pub fn product(store_id: &str, slug: &str, code: &str, title: &str, price: &str) -> Self {
        Self::new(format!("{}{slug}/p/{code}?utm_source=search", base_url(store_id)))
            .titled(title)
            .with(NAME, &slug.replace('-', " "))
            .with(PRICE, price)
    }
}

/// What one store's website does for each scripted query.
#[derive(Debug, Clone)]
pub struct FakeSite {
    pub home: FakePage,
    /// Page shown after submitting a query; unscripted queries get an empty results page.
    pub after_search: HashMap<String, FakePage>,
    /// Page shown after clicking the first result for a query.
    pub after_click: HashMap<String, FakePage>,
    pub unreachable: bool,
    pub panic_on_query: Option<String>,
    /// `close` reports an error after logging the attempt.
    pub fail_close: bool,
    /// Extra locators present on the home page, e.g. a search button.
    pub submit_button: Option<String>,
}

impl FakeSite {
    pub fn new(store_id: &str) -> Self {
        Self {
            home: FakePage::new(base_url(store_id))
                .titled("Home")
                .with(SEARCH_INPUT, ""),
            after_search: HashMap::new(),
            after_click: HashMap::new(),
            unreachable: false,
            panic_on_query: None,
            fail_close: false,
            submit_button: None,
        }
    }

    /// Query lands on a results list; clicking the first result opens `product`.
    pub fn listing(mut self, store_id: &str, query: &str, product: FakePage) -> Self {
        self.after_search
            .insert(query.to_owned(), FakePage::results(store_id));
        self.after_click.insert(query.to_owned(), product);
        self
    }

    /// Query redirects straight to `product`.
    pub fn redirect(mut self, query: &str, product: FakePage) -> Self {
        self.after_search.insert(query.to_owned(), product);
        self
    }

    pub fn no_results(mut self, store_id: &str, query: &str) -> Self {
        self.after_search.insert(
            query.to_owned(),
            FakePage::new(format!("{}search?q=none", base_url(store_id)))
                .with_source(&format!("<html><p>{NO_RESULTS}</p></html>")),
        );
        self
    }
}

// -----------------------------------------------------------------------
// Session
// -----------------------------------------------------------------------

pub type ActionLog = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &ActionLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    locator: String,
    text: String,
}

pub struct FakeSession {
    store: String,
    site: FakeSite,
    current: FakePage,
    typed: String,
    log: ActionLog,
}

impl FakeSession {
    pub fn new(store: &str, site: FakeSite, log: ActionLog) -> Self {
        Self {
            store: store.to_owned(),
            site,
            current: FakePage::default(),
            typed: String::new(),
            log,
        }
    }

    fn record(&self, action: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{action}:{}", self.store));
    }

    fn lookup(&self, locator: &Locator) -> Option<FakeElement> {
        let key = locator.to_string();
        let on_home_only = self.site.submit_button.as_deref() == Some(key.as_str())
            && self.current.url == self.site.home.url;
        if on_home_only {
            return Some(FakeElement {
                locator: key,
                text: "Search".to_owned(),
            });
        }
        self.current.elements.get(&key).map(|text| FakeElement {
            locator: key.clone(),
            text: text.clone(),
        })
    }

    fn submit(&mut self) {
        let query = std::mem::take(&mut self.typed);
        self.record("submit");
        if self.site.panic_on_query.as_deref() == Some(query.as_str()) {
            panic!("scripted panic while searching {query}");
        }
        self.current = self
            .site
            .after_search
            .get(&query)
            .cloned()
            .unwrap_or_else(|| FakePage::new(format!("{}search", self.site.home.url)));
        self.typed = query;
    }
}

impl BrowsingSession for FakeSession {
    type Element = FakeElement;

    async fn open(&mut self, url: &str) -> Result<(), SessionError> {
        self.record("open");
        if self.site.unreachable {
            return Err(SessionError::NavigationTimeout {
                url: url.to_owned(),
                timeout_secs: 60,
            });
        }
        self.current = self.site.home.clone();
        self.typed.clear();
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<FakeElement, SessionError> {
        self.lookup(locator)
            .ok_or_else(|| SessionError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<FakeElement, SessionError> {
        self.lookup(locator).ok_or_else(|| SessionError::WaitTimeout {
            locator: locator.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    async fn element_text(&mut self, element: &FakeElement) -> Result<String, SessionError> {
        Ok(element.text.clone())
    }

    async fn click(&mut self, element: &FakeElement) -> Result<(), SessionError> {
        self.record("click");
        if element.locator == FIRST_RESULT {
            self.current = self
                .site
                .after_click
                .get(&self.typed)
                .cloned()
                .unwrap_or_default();
        } else if self.site.submit_button.as_deref() == Some(element.locator.as_str()) {
            self.submit();
        }
        Ok(())
    }

    async fn send_keys(&mut self, _element: &FakeElement, keys: &str) -> Result<(), SessionError> {
        if keys == ENTER_KEY {
            self.submit();
        } else {
            self.typed.push_str(keys);
        }
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        Ok(self.current.url.clone())
    }

    async fn page_title(&mut self) -> Result<String, SessionError> {
        Ok(self.current.title.clone())
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        Ok(self.current.source.clone())
    }

    async fn close(self) -> Result<(), SessionError> {
        self.record("close");
        if self.site.fail_close {
            return Err(SessionError::Command("session already gone".to_owned()));
        }
        Ok(())
    }
}

/// Hands out [`FakeSession`]s for scripted stores; any store listed in
/// `failing` refuses to open.
#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    pub sites: HashMap<String, FakeSite>,
    pub failing: HashSet<String>,
    pub log: ActionLog,
}

impl FakeFactory {
    pub fn site(mut self, store_id: &str, site: FakeSite) -> Self {
        self.sites.insert(store_id.to_owned(), site);
        self
    }

    pub fn failing(mut self, store_id: &str) -> Self {
        self.failing.insert(store_id.to_owned());
        self
    }
}

impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn open_session(&self, profile: &SiteProfile) -> Result<FakeSession, SessionError> {
        let id = profile.store_id.as_str();
        if self.failing.contains(id) {
            return Err(SessionError::Connect {
                endpoint: "fake://driver".to_owned(),
                reason: format!("{id} refused"),
            });
        }
        let site = self
            .sites
            .get(id)
            .cloned()
            .unwrap_or_else(|| FakeSite::new(id));
        self.log.lock().unwrap().push(format!("session:{id}"));
        Ok(FakeSession::new(id, site, Arc::clone(&self.log)))
    }
}

// -----------------------------------------------------------------------
// Observer
// -----------------------------------------------------------------------

/// Keeps a one-line summary of every event.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent<'_>) {
        let line = match event {
            RunEvent::StoreStarted { store, items } => format!("store_started:{store}:{items}"),
            RunEvent::SessionFailed { store, .. } => format!("session_failed:{store}"),
            RunEvent::ItemStarted { task } => format!("item_started:{}", task.item_query),
            RunEvent::StepFailed { issue, .. } => format!("step_failed:{}", issue.step),
            RunEvent::RecordAssembled { record } => format!("record:{}", record.item_query),
            RunEvent::SessionCloseFailed { store, .. } => format!("close_failed:{store}"),
            RunEvent::StoreFinished { store, records } => {
                format!("store_finished:{store}:{records}")
            }
        };
        self.events.lock().unwrap().push(line);
    }
}

pub fn record_count(results: &RunResults, id: &str) -> Option<usize> {
    results.get(&store(id)).map(Vec::len)
}
