//! Test utilities for common test setup.
//!
//! This module provides shared test helpers used across multiple test modules.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::oneshot;

use crate::feed::{FetchError, Notice, Notifier, PageFetcher};
use crate::state::{CatalogItem, ItemKind};

/// What: Build `n` plain channel items with consecutive ids starting at `start`.
///
/// Inputs:
/// - `start`: First id
/// - `n`: Number of items
///
/// Output
/// - Items whose `created_at` increases with the id
pub fn items(start: i64, n: usize) -> Vec<CatalogItem> {
    (start..).take(n).map(|id| item(id, id)).collect()
}

/// Plain channel item created `hours` after a fixed base instant.
pub fn item(id: i64, hours: i64) -> CatalogItem {
    CatalogItem::new(id, ItemKind::Channel, at(hours))
}

/// Fixed base instant shifted by `hours`.
pub fn at(hours: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + hours * 3600, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Scripted response of a [`ScriptedFetcher`].
type Scripted = Result<Vec<CatalogItem>, String>;

/// Shared state of a [`ScriptedFetcher`].
#[derive(Default)]
struct Script {
    /// Pages requested, in call order.
    calls: Vec<u32>,
    /// Responses handed out in order; an exhausted script answers with an empty page.
    responses: VecDeque<Scripted>,
    /// When set, the next fetch waits for this signal before answering.
    gate: Option<oneshot::Receiver<()>>,
    /// Number of `invalidate` calls.
    invalidations: usize,
}

/// Page fetcher that replays scripted responses and records requested pages.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    /// Script shared across clones.
    script: Arc<Mutex<Script>>,
    /// Yield once to the scheduler before answering.
    yield_first: bool,
}

impl ScriptedFetcher {
    /// Fetcher with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher whose first call blocks until the returned sender fires.
    pub fn gated(response: Vec<CatalogItem>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let f = Self::new().then_ok(response);
        f.script.lock().expect("script lock").gate = Some(rx);
        (f, tx)
    }

    /// Yield to the scheduler once per fetch so concurrent callers can interleave.
    pub fn yielding(mut self) -> Self {
        self.yield_first = true;
        self
    }

    /// Queue a successful page.
    pub fn then_ok(self, page: Vec<CatalogItem>) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .responses
            .push_back(Ok(page));
        self
    }

    /// Queue a failed fetch.
    pub fn then_err(self, message: &str) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .responses
            .push_back(Err(message.to_string()));
        self
    }

    /// Pages requested so far.
    pub fn calls(&self) -> Vec<u32> {
        self.script.lock().expect("script lock").calls.clone()
    }

    /// How often the loader asked this fetcher to forget kept pages.
    pub fn invalidations(&self) -> usize {
        self.script.lock().expect("script lock").invalidations
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send {
        let (response, gate) = {
            let mut script = self.script.lock().expect("script lock");
            script.calls.push(page);
            let response = script.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()));
            (response, script.gate.take())
        };
        let yield_first = self.yield_first;
        async move {
            if yield_first {
                tokio::task::yield_now().await;
            }
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            response.map_err(Into::into)
        }
    }

    fn invalidate(&self) {
        self.script.lock().expect("script lock").invalidations += 1;
    }
}

/// Notifier that keeps every notice for later inspection.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    /// Notices in delivery order.
    seen: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    /// Notices delivered so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.seen.lock().expect("notices lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.seen.lock().expect("notices lock").push(notice);
    }
}
