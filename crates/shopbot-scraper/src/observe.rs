//! Run events and the observers that receive them.

use shopbot_core::{ProductRecord, SearchIssue, SearchTask, StoreId};

use crate::error::SessionError;

#[derive(Debug)]
pub enum RunEvent<'a> {
    StoreStarted {
        store: &'a StoreId,
        items: usize,
    },
    SessionFailed {
        store: &'a StoreId,
        error: &'a SessionError,
    },
    ItemStarted {
        task: &'a SearchTask,
    },
    StepFailed {
        task: &'a SearchTask,
        issue: &'a SearchIssue,
    },
    RecordAssembled {
        record: &'a ProductRecord,
    },
    SessionCloseFailed {
        store: &'a StoreId,
        error: &'a SessionError,
    },
    StoreFinished {
        store: &'a StoreId,
        records: usize,
    },
}

/// Receives progress and failure events from the coordinator and orchestrator.
pub trait RunObserver: Sync {
    fn on_event(&self, event: &RunEvent<'_>);
}

/// Forwards run events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent<'_>) {
        match event {
            RunEvent::StoreStarted { store, items } => {
                tracing::info!(store = %store, items, "starting store run");
            }
            RunEvent::SessionFailed { store, error } => {
                tracing::error!(
                    store = %store,
                    error = %error,
                    "could not open browser session; skipping store"
                );
            }
            RunEvent::ItemStarted { task } => {
                tracing::info!(
                    store = %task.store_id,
                    item = %task.item_query,
                    position = task.position + 1,
                    "searching"
                );
            }
            RunEvent::StepFailed { task, issue } => {
                tracing::warn!(
                    store = %task.store_id,
                    item = %task.item_query,
                    step = %issue.step,
                    reason = %issue.reason,
                    "search step failed"
                );
            }
            RunEvent::RecordAssembled { record } => {
                tracing::info!(
                    store = %record.store_id,
                    item = %record.item_query,
                    name = %record.product_name,
                    price = %record.price,
                    "product record assembled"
                );
            }
            RunEvent::SessionCloseFailed { store, error } => {
                tracing::warn!(store = %store, error = %error, "failed to close browser session");
            }
            RunEvent::StoreFinished { store, records } => {
                tracing::info!(store = %store, records, "store run finished");
            }
        }
    }
}
