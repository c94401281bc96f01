//! Single-item search against one store's page, under a fail-soft contract.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use shopbot_core::{
    FieldValue, Locator, ProductRecord, SearchIssue, SearchStep, SearchTask, SiteProfile,
    SubmitAction,
};

use crate::error::SessionError;
use crate::extract::{extract_name, extract_price, rewrite_url};
use crate::observe::{RunEvent, RunObserver};
use crate::session::{BrowsingSession, ENTER_KEY};

/// Timing knobs for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Upper bound for each wait on a result or product element.
    pub wait_timeout: Duration,
    /// Pause after a clicked result's product page appears, before reading fields.
    pub settle_delay: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// Where the browser ended up after submitting the search.
enum Landing {
    /// The store redirected straight to a single product.
    ProductPage,
    /// A results list; the first result was clicked.
    FirstResult,
}

/// Collects issues for one task and reports them as they happen.
struct Attempt<'a, O: ?Sized> {
    task: &'a SearchTask,
    observer: &'a O,
    issues: Vec<SearchIssue>,
}

impl<O: RunObserver + ?Sized> Attempt<'_, O> {
    fn note(&mut self, step: SearchStep, reason: impl fmt::Display) {
        let issue = SearchIssue {
            step,
            reason: reason.to_string(),
        };
        self.observer.on_event(&RunEvent::StepFailed {
            task: self.task,
            issue: &issue,
        });
        self.issues.push(issue);
    }

    fn finish(
        self,
        product_name: FieldValue<String>,
        price: FieldValue<Decimal>,
        source_url: String,
    ) -> ProductRecord {
        let record = ProductRecord {
            store_id: self.task.store_id.clone(),
            item_query: self.task.item_query.clone(),
            product_name,
            price,
            source_url,
            issues: self.issues,
        };
        self.observer
            .on_event(&RunEvent::RecordAssembled { record: &record });
        record
    }

    fn fail(mut self, step: SearchStep, reason: impl fmt::Display) -> ProductRecord {
        self.note(step, reason);
        let record = ProductRecord::failed(self.task, self.issues);
        self.observer
            .on_event(&RunEvent::RecordAssembled { record: &record });
        record
    }
}

/// Searches `profile`'s site for `task.item_query` and extracts one record.
///
/// Never fails: a step that cannot complete degrades the affected fields to
/// `Unavailable` and is recorded in [`ProductRecord::issues`]. The session is
/// left open for the next item.
pub async fn search_item<S, O>(
    session: &mut S,
    profile: &SiteProfile,
    task: &SearchTask,
    settings: &SearchSettings,
    observer: &O,
) -> ProductRecord
where
    S: BrowsingSession,
    O: RunObserver + ?Sized,
{
    observer.on_event(&RunEvent::ItemStarted { task });
    let mut attempt = Attempt {
        task,
        observer,
        issues: Vec::new(),
    };

    if let Err(e) = session.open(&profile.base_url).await {
        return attempt.fail(SearchStep::Navigate, e);
    }

    if let Err(e) = submit_search(session, profile, &task.item_query, settings).await {
        return attempt.fail(SearchStep::Search, e);
    }

    match confirm_result(session, profile, settings).await {
        Ok(Landing::FirstResult) => {
            if let Err(e) = session
                .wait_for(&profile.name_locator, settings.wait_timeout)
                .await
            {
                attempt.note(SearchStep::Settle, e);
            }
            if !settings.settle_delay.is_zero() {
                tokio::time::sleep(settings.settle_delay).await;
            }
        }
        Ok(Landing::ProductPage) => {}
        Err(reason) => return attempt.fail(SearchStep::ConfirmResult, reason),
    }

    let current_url = match session.current_url().await {
        Ok(url) => url,
        Err(e) => {
            attempt.note(SearchStep::ReadUrl, e);
            String::new()
        }
    };

    let title = match session.page_title().await {
        Ok(title) => title,
        Err(e) => {
            tracing::debug!(store = %task.store_id, error = %e, "page title unreadable");
            String::new()
        }
    };
    let fallback = read_text(session, &profile.name_locator)
        .await
        .unwrap_or_default();
    let product_name = extract_name(&title, &fallback, &current_url, &profile.title_separator);
    if !product_name.is_present() {
        attempt.note(
            SearchStep::ExtractName,
            "neither the page title nor the name element held a product name",
        );
        return attempt.finish(FieldValue::Unavailable, FieldValue::Unavailable, String::new());
    }

    let mut price = FieldValue::Unavailable;
    for locator in &profile.price_locators {
        let Ok(text) = read_text(session, locator).await else {
            continue;
        };
        price = extract_price(&text, &profile.price_rule);
        if price.is_present() {
            break;
        }
    }
    if !price.is_present() {
        attempt.note(
            SearchStep::ExtractPrice,
            "no price element yielded a parseable price",
        );
    }

    let source_url = if current_url.is_empty() {
        String::new()
    } else {
        rewrite_url(&current_url, profile)
    };
    attempt.finish(product_name, price, source_url)
}

async fn submit_search<S: BrowsingSession>(
    session: &mut S,
    profile: &SiteProfile,
    query: &str,
    settings: &SearchSettings,
) -> Result<(), SessionError> {
    let input = session
        .wait_for(&profile.search_input, settings.wait_timeout)
        .await?;
    session.send_keys(&input, query).await?;
    match &profile.submit {
        SubmitAction::EnterKey => session.send_keys(&input, ENTER_KEY).await,
        SubmitAction::Click { target } => {
            let button = session.wait_for(target, settings.wait_timeout).await?;
            session.click(&button).await
        }
    }
}

/// Decides whether the search landed on a product page, and if not, opens the
/// first result.
///
/// Only the first price locator (the promotional price) is consulted: results
/// lists commonly render a normal-price tile per listing, so a normal price
/// alone does not mean the store redirected straight to the product.
async fn confirm_result<S: BrowsingSession>(
    session: &mut S,
    profile: &SiteProfile,
    settings: &SearchSettings,
) -> Result<Landing, String> {
    if let Some(marker) = &profile.no_results_marker {
        match session.page_source().await {
            Ok(source) if source.contains(marker.as_str()) => {
                return Err(format!("store reported no results (\"{marker}\")"));
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "page source unreadable; skipping no-results check"),
        }
    }

    if let Some(promo) = profile.price_locators.first() {
        if let Ok(text) = read_text(session, promo).await {
            if text.contains(profile.price_rule.currency()) {
                return Ok(Landing::ProductPage);
            }
        }
    }

    let first = session
        .wait_for(&profile.first_result, settings.wait_timeout)
        .await
        .map_err(|e| e.to_string())?;
    session.click(&first).await.map_err(|e| e.to_string())?;
    Ok(Landing::FirstResult)
}

async fn read_text<S: BrowsingSession>(
    session: &mut S,
    locator: &Locator,
) -> Result<String, SessionError> {
    let element = session.find_element(locator).await?;
    session.element_text(&element).await
}
