use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::client::{HttpSource, PageSource};
use crate::config::AppConfig;
use crate::detail::DetailResolver;
use crate::events::EventListFetcher;
use crate::expansion::{DetailRequest, ExpansionState, ItemState};
use crate::filter::FilterCriteria;
use crate::models::Event;
use crate::report::{FailureReporter, TracingReporter};

/// Consumers of feed state changes, typically the rendering layer.
pub trait FeedObserver: Send + Sync {
    fn events_replaced(&self, events: &[Event]);

    fn item_changed(&self, _id: i64, _item: &ItemState) {}
}

#[derive(Default)]
struct FeedState {
    criteria: FilterCriteria,
    events: Vec<Event>,
    // Generation of the most recently dispatched list fetch.
    dispatched: u64,
    // Bumped on every list replacement; scopes expansion and detail results.
    epoch: u64,
    expansion: ExpansionState,
}

struct FeedInner {
    fetcher: EventListFetcher,
    resolver: DetailResolver,
    state: Mutex<FeedState>,
    observers: Mutex<Vec<Arc<dyn FeedObserver>>>,
}

#[derive(Clone)]
pub struct Feed {
    inner: Arc<FeedInner>,
}

impl Feed {
    pub fn new(source: Arc<dyn PageSource>, reporter: Arc<dyn FailureReporter>, base: Url) -> Self {
        let fetcher = EventListFetcher::new(source.clone(), reporter.clone(), base.clone());
        let resolver = DetailResolver::new(source, reporter, base);
        Self {
            inner: Arc::new(FeedInner {
                fetcher,
                resolver,
                state: Mutex::new(FeedState::default()),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let base = config.base()?;
        let source = HttpSource::new(config)?;
        Ok(Self::new(Arc::new(source), Arc::new(TracingReporter), base))
    }

    pub fn subscribe(&self, observer: Arc<dyn FeedObserver>) {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state().criteria.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn item(&self, id: i64) -> ItemState {
        self.state().expansion.item(id)
    }

    /// Applies `update` to the criteria and refetches when they changed.
    /// Returns whether a fetched list was applied.
    pub async fn update_criteria<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut FilterCriteria),
    {
        let changed = {
            let mut state = self.state();
            let before = state.criteria.clone();
            update(&mut state.criteria);
            state.criteria != before
        };
        if !changed {
            debug!("criteria unchanged, keeping current list");
            return false;
        }
        self.refresh().await
    }

    /// Fetches the list for the current criteria. The result replaces the
    /// visible list only if no newer fetch was dispatched meanwhile.
    pub async fn refresh(&self) -> bool {
        let (generation, criteria) = {
            let mut state = self.state();
            state.dispatched += 1;
            (state.dispatched, state.criteria.clone())
        };
        debug!(generation, "dispatching event list fetch");

        let events = self.inner.fetcher.fetch_events(&criteria).await;

        let snapshot = {
            let mut state = self.state();
            if state.dispatched != generation {
                debug!(
                    generation,
                    latest = state.dispatched,
                    "discarding stale event list"
                );
                return false;
            }
            state.events = events;
            state.epoch += 1;
            state.expansion.reset();
            self.inner.resolver.clear();
            state.events.clone()
        };
        info!(generation, count = snapshot.len(), "event list replaced");

        for observer in self.observers() {
            observer.events_replaced(&snapshot);
        }
        true
    }

    pub async fn toggle(&self, id: i64) -> Option<ItemState> {
        self.transition(id, |expansion| expansion.toggle(id)).await
    }

    pub async fn expand(&self, id: i64) -> Option<ItemState> {
        self.transition(id, |expansion| expansion.expand(id)).await
    }

    pub async fn collapse(&self, id: i64) -> Option<ItemState> {
        self.transition(id, |expansion| {
            expansion.collapse(id);
            None
        })
        .await
    }

    async fn transition<F>(&self, id: i64, apply: F) -> Option<ItemState>
    where
        F: FnOnce(&mut ExpansionState) -> Option<DetailRequest>,
    {
        let (request, path, epoch, item) = {
            let mut state = self.state();
            let Some(path) = state
                .events
                .iter()
                .find(|event| event.id == id)
                .map(|event| event.url.clone())
            else {
                warn!(id, "ignoring expansion change for unknown event");
                return None;
            };
            let request = apply(&mut state.expansion);
            let item = state.expansion.item(id);
            (request, path, state.epoch, item)
        };
        self.notify_item(id, &item);

        let Some(request) = request else {
            return Some(item);
        };

        // Detached so the result lands even if the caller stops awaiting.
        let feed = self.clone();
        let task = tokio::spawn(async move { feed.load_detail(request, path, epoch).await });
        match task.await {
            Ok(item) => item,
            Err(err) => {
                warn!(id, "detail task failed: {err}");
                None
            }
        }
    }

    async fn load_detail(&self, request: DetailRequest, path: String, epoch: u64) -> Option<ItemState> {
        let content = self.inner.resolver.resolve_detail(&path).await;

        let item = {
            let mut state = self.state();
            if state.epoch != epoch {
                debug!(id = request.id, "discarding detail for replaced event list");
                return None;
            }
            state.expansion.complete(request.id, content);
            state.expansion.item(request.id)
        };
        self.notify_item(request.id, &item);
        Some(item)
    }

    fn notify_item(&self, id: i64, item: &ItemState) {
        for observer in self.observers() {
            observer.item_changed(id, item);
        }
    }

    fn observers(&self) -> Vec<Arc<dyn FeedObserver>> {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
