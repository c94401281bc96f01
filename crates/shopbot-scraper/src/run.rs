//! Runs every requested item against every requested store.

use std::panic::AssertUnwindSafe;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use shopbot_core::{
    ProductRecord, RunResults, SearchTask, SiteProfile, SiteRegistry, StoreId, UnknownStore,
};

use crate::observe::{RunEvent, RunObserver};
use crate::search::{search_item, SearchSettings};
use crate::session::{BrowsingSession, SessionFactory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub search: SearchSettings,
    /// Stores searched at once, each with its own session. Clamped to at least 1.
    pub max_concurrent_stores: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            max_concurrent_stores: 1,
        }
    }
}

/// Searches each of `items`, in order, at each store in `store_ids`.
///
/// Every store id is resolved before any session is opened, so an unknown id
/// fails the whole call up front. Duplicate ids are searched once. A store
/// whose session cannot be opened is reported to `observer` and left out of
/// the result; every other store gets exactly one record per item, in item
/// order.
///
/// # Errors
///
/// Returns [`UnknownStore`] if any id has no registered profile.
pub async fn run_all<F, O>(
    factory: &F,
    registry: &SiteRegistry,
    items: &[String],
    store_ids: &[StoreId],
    settings: &RunSettings,
    observer: &O,
) -> Result<RunResults, UnknownStore>
where
    F: SessionFactory,
    O: RunObserver + ?Sized,
{
    let mut profiles: Vec<&SiteProfile> = Vec::with_capacity(store_ids.len());
    for id in store_ids {
        let profile = registry.profile_for(id)?;
        if profiles.iter().any(|p| p.store_id == *id) {
            tracing::debug!(store = %id, "store requested twice; searching it once");
            continue;
        }
        profiles.push(profile);
    }

    let max_concurrent = settings.max_concurrent_stores.max(1);
    let runs: Vec<_> = profiles
        .into_iter()
        .map(|profile| run_store_keyed(factory, profile, items, &settings.search, observer))
        .collect();
    let outcomes: Vec<(&StoreId, Option<Vec<ProductRecord>>)> = stream::iter(runs)
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let mut results = RunResults::new();
    for (store_id, records) in outcomes {
        if let Some(records) = records {
            results.insert(store_id.clone(), records);
        }
    }
    Ok(results)
}

/// [`run_store`], paired with the store it ran against.
async fn run_store_keyed<'p, F, O>(
    factory: &F,
    profile: &'p SiteProfile,
    items: &[String],
    settings: &SearchSettings,
    observer: &O,
) -> (&'p StoreId, Option<Vec<ProductRecord>>)
where
    F: SessionFactory,
    O: RunObserver + ?Sized,
{
    let records = run_store(factory, profile, items, settings, observer).await;
    (&profile.store_id, records)
}

/// One store's run on its own session. `None` when the session never opened.
///
/// The session is closed before this returns, including when an item search
/// panics; the panic is re-raised after the close.
async fn run_store<F, O>(
    factory: &F,
    profile: &SiteProfile,
    items: &[String],
    settings: &SearchSettings,
    observer: &O,
) -> Option<Vec<ProductRecord>>
where
    F: SessionFactory,
    O: RunObserver + ?Sized,
{
    let store = &profile.store_id;
    observer.on_event(&RunEvent::StoreStarted {
        store,
        items: items.len(),
    });

    let mut session = match factory.open_session(profile).await {
        Ok(session) => session,
        Err(error) => {
            observer.on_event(&RunEvent::SessionFailed {
                store,
                error: &error,
            });
            return None;
        }
    };

    let outcome = AssertUnwindSafe(search_items(
        &mut session,
        profile,
        items,
        settings,
        observer,
    ))
    .catch_unwind()
    .await;

    if let Err(error) = session.close().await {
        observer.on_event(&RunEvent::SessionCloseFailed {
            store,
            error: &error,
        });
    }

    let records = match outcome {
        Ok(records) => records,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    observer.on_event(&RunEvent::StoreFinished {
        store,
        records: records.len(),
    });
    Some(records)
}

async fn search_items<S, O>(
    session: &mut S,
    profile: &SiteProfile,
    items: &[String],
    settings: &SearchSettings,
    observer: &O,
) -> Vec<ProductRecord>
where
    S: BrowsingSession,
    O: RunObserver + ?Sized,
{
    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let task = SearchTask {
            store_id: profile.store_id.clone(),
            item_query: item.clone(),
            position,
        };
        records.push(search_item(session, profile, &task, settings, observer).await);
    }
    records
}
