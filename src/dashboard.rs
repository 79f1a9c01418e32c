//! Dashboard event loop.
//!
//! One task owns the token store, the notification queue and the update
//! scheduler. Views talk to it through a [`DashboardHandle`]: intents go in
//! over a channel, state comes out over `watch` subscriptions. Fetches run in
//! spawned tasks and report back to the loop, which applies them in order
//! with every other mutation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::cron::{jobs, UpdateScheduler};
use crate::feed::{parse_message, FetchError, TokenSource};
use crate::models::{Category, NewNotification, Notification, Token};
use crate::store::{
    CategoryFilter, LoadTicket, NotificationQueue, SortDirection, SortField, StoreSnapshot,
    TokenStore, ViewParams,
};

const INTENT_CHANNEL_CAPACITY: usize = 128;

/// A user or feed event for the dashboard loop.
#[derive(Debug, Clone)]
pub enum Intent {
    Load(Option<Category>),
    /// Apply one price tick now, outside the schedule
    PriceTick,
    SetSort(SortField, SortDirection),
    ToggleSort(SortField),
    SetCategoryFilter(CategoryFilter),
    SetSearchQuery(String),
    SelectToken(Option<String>),
    SetRealTimeUpdates(bool),
    ToggleRealTimeUpdates,
    /// Raw real-time feed payload
    Message(String),
    Notify(NewNotification),
    MarkNotificationRead(String),
    RemoveNotification(String),
    ClearNotifications,
}

type FetchOutcome = (LoadTicket, Result<Vec<Token>, FetchError>);

pub struct Dashboard {
    store: TokenStore,
    notifications: NotificationQueue,
    scheduler: UpdateScheduler,
    source: Arc<dyn TokenSource>,
    intents: mpsc::Receiver<Intent>,
    fetches: JoinSet<FetchOutcome>,
}

/// Cloneable sender side of a [`Dashboard`].
#[derive(Clone)]
pub struct DashboardHandle {
    tx: mpsc::Sender<Intent>,
    state: watch::Receiver<StoreSnapshot>,
    notifications: watch::Receiver<Arc<Vec<Notification>>>,
}

impl Dashboard {
    pub fn new(settings: &Settings, source: Arc<dyn TokenSource>) -> (Self, DashboardHandle) {
        let params = ViewParams {
            category: settings.view.category,
            search: String::new(),
            sort_field: settings.view.sort_field,
            sort_direction: settings.view.sort_direction,
        };
        let store = TokenStore::new(params, settings.updates.real_time_updates);
        let notifications = NotificationQueue::new(settings.notifications.cap);
        let (tx, intents) = mpsc::channel(INTENT_CHANNEL_CAPACITY);

        let handle = DashboardHandle {
            tx,
            state: store.subscribe(),
            notifications: notifications.subscribe(),
        };

        let dashboard = Self {
            store,
            notifications,
            scheduler: UpdateScheduler::new(settings.refresh_interval()),
            source,
            intents,
            fetches: JoinSet::new(),
        };

        (dashboard, handle)
    }

    /// Run the event loop until cancelled or every handle is dropped.
    pub async fn run(mut self, cancellation_token: CancellationToken) -> Result<()> {
        self.sync_scheduler();
        info!("Dashboard: event loop started");

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Dashboard: Received cancellation signal");
                    break;
                }
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.handle(intent),
                    None => {
                        info!("Dashboard: All handles dropped");
                        break;
                    },
                },
                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    match joined {
                        Ok((ticket, result)) => self.complete_load(ticket, result),
                        Err(e) => error!("Dashboard: Fetch task failed: {}", e),
                    }
                }
                tick = self.scheduler.next_tick() => {
                    debug!("Dashboard: Price tick #{}", tick);
                    jobs::price_tick::run(&mut self.store, self.source.as_ref());
                }
            }
        }

        self.scheduler.stop();
        self.fetches.abort_all();
        info!("Dashboard: Shutdown complete");
        Ok(())
    }

    fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::Load(category) => self.start_load(category),
            Intent::PriceTick => jobs::price_tick::run(&mut self.store, self.source.as_ref()),
            Intent::SetSort(field, direction) => self.store.set_sort(field, direction),
            Intent::ToggleSort(field) => self.store.toggle_sort(field),
            Intent::SetCategoryFilter(filter) => self.store.set_category_filter(filter),
            Intent::SetSearchQuery(query) => self.store.set_search_query(query),
            Intent::SelectToken(id) => {
                self.store.select_token(id.as_deref());
            },
            Intent::SetRealTimeUpdates(enabled) => {
                self.store.set_real_time_updates(enabled);
                self.sync_scheduler();
            },
            Intent::ToggleRealTimeUpdates => {
                self.store.toggle_real_time_updates();
                self.sync_scheduler();
            },
            Intent::Message(raw) => self.ingest_message(&raw),
            Intent::Notify(new) => {
                self.notifications.push(new);
            },
            Intent::MarkNotificationRead(id) => {
                self.notifications.mark_read(&id);
            },
            Intent::RemoveNotification(id) => {
                self.notifications.remove(&id);
            },
            Intent::ClearNotifications => self.notifications.clear_all(),
        }
    }

    fn start_load(&mut self, category: Option<Category>) {
        let ticket = self.store.begin_load(category);
        let source = Arc::clone(&self.source);

        // A panicking source still completes its ticket, as a generation error.
        self.fetches.spawn(async move {
            let result = AssertUnwindSafe(source.fetch(category))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(FetchError::Generation(panic_message(&*panic)))
                });
            (ticket, result)
        });
    }

    fn complete_load(&mut self, ticket: LoadTicket, result: Result<Vec<Token>, FetchError>) {
        let failure = result.as_ref().err().map(ToString::to_string);

        if self.store.finish_load(ticket, result) {
            if let Some(message) = failure {
                self.notifications
                    .push(NewNotification::error("Failed to load tokens", message));
            }
        }
    }

    fn ingest_message(&mut self, raw: &str) {
        match parse_message(raw) {
            Ok(updates) => {
                for update in &updates {
                    self.store.apply_price_update(update);
                }
            },
            Err(e) => warn!("Dashboard: Dropping real-time message: {}", e),
        }
    }

    fn sync_scheduler(&mut self) {
        self.scheduler.set_running(self.store.real_time_updates());
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned());

    match detail {
        Some(detail) => format!("token source panicked: {}", detail),
        None => "token source panicked".to_string(),
    }
}

impl DashboardHandle {
    pub async fn send(&self, intent: Intent) -> Result<()> {
        self.tx
            .send(intent)
            .await
            .context("Dashboard event loop is not running")
    }

    pub async fn load(&self, category: Option<Category>) -> Result<()> {
        self.send(Intent::Load(category)).await
    }

    /// Subscription to the store state.
    pub fn state(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.clone()
    }

    /// Subscription to the notification list, most recent first.
    pub fn notifications(&self) -> watch::Receiver<Arc<Vec<Notification>>> {
        self.notifications.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::feed::FixedTokenSource;

    fn settings(real_time_updates: bool) -> Settings {
        let mut settings = Settings::default();
        settings.updates.real_time_updates = real_time_updates;
        settings.updates.refresh_interval_ms = 1_000;
        settings
    }

    fn sample() -> Vec<Token> {
        vec![
            Token::new("pepe-0", "PEPE", "Pepe Token", Category::NewPairs).with_price(1.0),
            Token::new("wif-1", "WIF", "Dogwifhat", Category::FinalStretch).with_price(2.0),
            Token::new("bonk-2", "BONK", "Bonk", Category::Migrated).with_price(3.0),
        ]
    }

    fn spawn(
        settings: &Settings,
        source: Arc<dyn TokenSource>,
    ) -> (DashboardHandle, CancellationToken, tokio::task::JoinHandle<Result<()>>) {
        let (dashboard, handle) = Dashboard::new(settings, source);
        let token = CancellationToken::new();
        let task = tokio::spawn(dashboard.run(token.clone()));
        (handle, token, task)
    }

    fn prices(snapshot: &StoreSnapshot) -> Vec<f64> {
        let mut prices: Vec<f64> = snapshot.visible.iter().map(|t| t.price).collect();
        prices.sort_by(f64::total_cmp);
        prices
    }

    /// Category-filtered fetches are slow, unfiltered fetches are fast.
    struct CategoryLatency {
        filtered: Vec<Token>,
        unfiltered: Vec<Token>,
    }

    #[async_trait]
    impl TokenSource for CategoryLatency {
        async fn fetch(&self, category: Option<Category>) -> Result<Vec<Token>, FetchError> {
            match category {
                Some(_) => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(self.filtered.clone())
                },
                None => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(self.unfiltered.clone())
                },
            }
        }

        fn next_tick(&self, tokens: &[Token]) -> Vec<Token> {
            tokens.to_vec()
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl TokenSource for PanickingSource {
        async fn fetch(&self, _category: Option<Category>) -> Result<Vec<Token>, FetchError> {
            panic!("generator exploded");
        }

        fn next_tick(&self, tokens: &[Token]) -> Vec<Token> {
            tokens.to_vec()
        }
    }

    fn visible_ids(snapshot: &StoreSnapshot) -> Vec<String> {
        snapshot.visible.iter().map(|t| t.id.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_becomes_generation_error() {
        let (handle, token, task) = spawn(&settings(false), Arc::new(PanickingSource));
        let mut state = handle.state();
        let mut notifications = handle.notifications();

        handle.load(None).await.unwrap();
        state.wait_for(|s| s.error.is_some()).await.unwrap();

        {
            let snapshot = state.borrow();
            assert!(!snapshot.loading);
            assert_eq!(
                snapshot.error.as_deref(),
                Some("Generation error: token source panicked: generator exploded")
            );
        }
        notifications.wait_for(|n| n.len() == 1).await.unwrap();

        // The loop keeps serving intents afterwards
        handle.send(Intent::SetSearchQuery("pep".into())).await.unwrap();
        state.wait_for(|s| s.params.search == "pep").await.unwrap();

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_search_sort_scenario_through_handle() {
        let source = Arc::new(FixedTokenSource::new(sample()).with_tick(2.0, 0.0));
        let (handle, token, task) = spawn(&settings(false), source);
        let mut state = handle.state();
        let mut notifications = handle.notifications();

        handle.load(None).await.unwrap();
        state.wait_for(|s| s.total == 3).await.unwrap();

        handle
            .send(Intent::SetCategoryFilter(Category::FinalStretch.into()))
            .await
            .unwrap();
        state.wait_for(|s| visible_ids(s) == ["wif-1"]).await.unwrap();

        handle.send(Intent::SetSearchQuery("zzz".into())).await.unwrap();
        state.wait_for(|s| s.visible.is_empty()).await.unwrap();

        handle.send(Intent::SetSearchQuery(String::new())).await.unwrap();
        handle
            .send(Intent::SetSort(SortField::Price, SortDirection::Asc))
            .await
            .unwrap();
        handle.send(Intent::SetCategoryFilter(CategoryFilter::All)).await.unwrap();
        state
            .wait_for(|s| visible_ids(s) == ["pepe-0", "wif-1", "bonk-2"])
            .await
            .unwrap();

        // Asc on the current field flips to Desc
        handle.send(Intent::ToggleSort(SortField::Price)).await.unwrap();
        state
            .wait_for(|s| visible_ids(s) == ["bonk-2", "wif-1", "pepe-0"])
            .await
            .unwrap();

        handle.send(Intent::PriceTick).await.unwrap();
        state.wait_for(|s| prices(s) == vec![2.0, 4.0, 6.0]).await.unwrap();

        handle.send(Intent::SetRealTimeUpdates(true)).await.unwrap();
        state.wait_for(|s| prices(s) == vec![4.0, 8.0, 12.0]).await.unwrap();
        handle.send(Intent::SetRealTimeUpdates(false)).await.unwrap();
        state.wait_for(|s| !s.real_time_updates).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(prices(&state.borrow()), vec![4.0, 8.0, 12.0]);

        handle
            .send(Intent::Notify(NewNotification::info("First", "one")))
            .await
            .unwrap();
        handle
            .send(Intent::Notify(NewNotification::info("Second", "two")))
            .await
            .unwrap();
        notifications.wait_for(|n| n.len() == 2).await.unwrap();
        let oldest = notifications.borrow()[1].id.clone();

        handle.send(Intent::RemoveNotification(oldest)).await.unwrap();
        notifications.wait_for(|n| n.len() == 1).await.unwrap();
        assert_eq!(notifications.borrow()[0].title, "Second");

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_fetch_does_not_overwrite_newer_load() {
        let source = Arc::new(CategoryLatency {
            filtered: vec![Token::new("old-0", "OLD", "Old", Category::NewPairs)],
            unfiltered: sample(),
        });
        let (handle, token, task) = spawn(&settings(false), source);
        let mut state = handle.state();

        handle.load(Some(Category::NewPairs)).await.unwrap();
        handle.load(None).await.unwrap();

        state.wait_for(|s| !s.loading && s.total == 3).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let snapshot = state.borrow().clone();
        assert_eq!(snapshot.total, 3);
        assert!(snapshot.visible.iter().all(|t| t.id != "old-0"));
        assert!(!snapshot.loading);

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_real_time_stops_ticks() {
        let source = Arc::new(FixedTokenSource::new(sample()).with_tick(2.0, 0.0));
        let (handle, token, task) = spawn(&settings(true), source);
        let mut state = handle.state();

        handle.load(None).await.unwrap();
        state.wait_for(|s| s.total == 3).await.unwrap();
        state.wait_for(|s| prices(s) == vec![2.0, 4.0, 6.0]).await.unwrap();

        handle.send(Intent::ToggleRealTimeUpdates).await.unwrap();
        state.wait_for(|s| !s.real_time_updates).await.unwrap();
        let frozen = state.borrow().clone();

        tokio::time::sleep(Duration::from_secs(60)).await;

        let snapshot = state.borrow().clone();
        assert_eq!(prices(&snapshot), prices(&frozen));
        let last_updates = |s: &StoreSnapshot| -> Vec<_> {
            s.visible.iter().map(|t| t.last_update).collect()
        };
        assert_eq!(last_updates(&snapshot), last_updates(&frozen));

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_message_is_dropped() {
        let source = Arc::new(FixedTokenSource::new(sample()));
        let (handle, token, task) = spawn(&settings(false), source);
        let mut state = handle.state();

        handle.load(None).await.unwrap();
        state.wait_for(|s| s.total == 3).await.unwrap();

        handle.send(Intent::Message("{not json".into())).await.unwrap();
        handle
            .send(Intent::Message(r#"{"id":"wif-1","price":-5}"#.into()))
            .await
            .unwrap();
        handle
            .send(Intent::Message(r#"{"id":"pepe-0","price":7.5}"#.into()))
            .await
            .unwrap();

        state.wait_for(|s| prices(s) == vec![2.0, 3.0, 7.5]).await.unwrap();
        assert!(state.borrow().error.is_none());
        assert!(handle.notifications().borrow().is_empty());

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_sets_error_and_notifies() {
        let source = Arc::new(
            FixedTokenSource::new(sample()).failing(FetchError::Generation("boom".into())),
        );
        let (handle, token, task) = spawn(&settings(false), source);
        let mut state = handle.state();
        let mut notifications = handle.notifications();

        handle.load(None).await.unwrap();
        state.wait_for(|s| s.error.is_some()).await.unwrap();
        assert_eq!(state.borrow().error.as_deref(), Some("Generation error: boom"));
        assert!(!state.borrow().loading);

        notifications.wait_for(|n| n.len() == 1).await.unwrap();
        assert_eq!(notifications.borrow()[0].title, "Failed to load tokens");

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_and_notification_intents() {
        let source = Arc::new(FixedTokenSource::new(sample()));
        let (handle, token, task) = spawn(&settings(false), source);
        let mut state = handle.state();
        let mut notifications = handle.notifications();

        handle.load(None).await.unwrap();
        state.wait_for(|s| s.total == 3).await.unwrap();

        handle
            .send(Intent::SetCategoryFilter(Category::FinalStretch.into()))
            .await
            .unwrap();
        handle.send(Intent::SelectToken(Some("bonk-2".into()))).await.unwrap();
        state
            .wait_for(|s| s.visible.len() == 1 && s.selected.is_some())
            .await
            .unwrap();
        assert_eq!(state.borrow().visible[0].id, "wif-1");

        handle
            .send(Intent::Notify(NewNotification::info("Hello", "world")))
            .await
            .unwrap();
        notifications.wait_for(|n| n.len() == 1).await.unwrap();
        let id = notifications.borrow()[0].id.clone();

        handle.send(Intent::MarkNotificationRead(id)).await.unwrap();
        notifications.wait_for(|n| n[0].read).await.unwrap();

        handle.send(Intent::ClearNotifications).await.unwrap();
        notifications.wait_for(|n| n.is_empty()).await.unwrap();

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_ends_when_handles_dropped() {
        let (dashboard, handle) =
            Dashboard::new(&settings(false), Arc::new(FixedTokenSource::new(Vec::new())));
        drop(handle);

        dashboard.run(CancellationToken::new()).await.unwrap();
    }
}
