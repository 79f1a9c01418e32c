//! Canonical token collection and its visible projection.
//!
//! The store owns the authoritative list of records. Every mutator ends by
//! re-running [`project`](super::project) over the canonical list and
//! publishing a fresh [`StoreSnapshot`]; the projection is never edited in
//! place.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use tokio::sync::watch;

use crate::feed::{FetchError, PriceUpdate, TokenSource};
use crate::models::{Category, Token};
use crate::utils::{normalize_token, validate_usd_amount, validate_usd_price};

use super::{CategoryFilter, SortDirection, SortField, ViewParams};

/// Identifies one fetch of the collection.
///
/// Only the most recently issued ticket may complete a load; responses
/// carrying an older ticket are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    category: Option<Category>,
}

impl LoadTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Read-only view of the store published to subscribers.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub visible: Arc<Vec<Token>>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<Token>,
    pub params: ViewParams,
    pub real_time_updates: bool,
    /// Size of the canonical collection
    pub total: usize,
}

pub struct TokenStore {
    tokens: Vec<Token>,
    index: FxHashMap<String, usize>,
    visible: Arc<Vec<Token>>,
    params: ViewParams,
    loading: bool,
    error: Option<String>,
    selected: Option<String>,
    real_time_updates: bool,
    last_seq: u64,
    pending: Option<u64>,
    tx: watch::Sender<StoreSnapshot>,
}

impl TokenStore {
    pub fn new(params: ViewParams, real_time_updates: bool) -> Self {
        let (tx, _) = watch::channel(StoreSnapshot {
            params: params.clone(),
            real_time_updates,
            ..Default::default()
        });

        Self {
            tokens: Vec::new(),
            index: FxHashMap::default(),
            visible: Arc::new(Vec::new()),
            params,
            loading: false,
            error: None,
            selected: None,
            real_time_updates,
            last_seq: 0,
            pending: None,
            tx,
        }
    }

    // ============================================
    // Loading
    // ============================================

    /// Start a load: issues a new ticket, sets `loading` and clears the error.
    ///
    /// Any load still in flight is superseded by the new ticket.
    pub fn begin_load(&mut self, category: Option<Category>) -> LoadTicket {
        self.last_seq += 1;
        if let Some(previous) = self.pending.replace(self.last_seq) {
            debug!("Load #{} superseded by #{}", previous, self.last_seq);
        }

        self.loading = true;
        self.error = None;
        self.publish();

        info!(
            "Loading tokens (#{}, category: {})",
            self.last_seq,
            category.map_or("all", |c| c.as_str())
        );

        LoadTicket {
            seq: self.last_seq,
            category,
        }
    }

    /// Complete a load started with [`begin_load`](Self::begin_load).
    ///
    /// On success the canonical collection is replaced. On failure the
    /// previous collection stays and the error flag is set.
    ///
    /// # Returns
    /// * `false` if the ticket is stale and the result was discarded
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Token>, FetchError>,
    ) -> bool {
        if self.pending != Some(ticket.seq) {
            debug!(
                "Discarding stale load #{} (latest #{})",
                ticket.seq, self.last_seq
            );
            return false;
        }
        self.pending = None;
        self.loading = false;

        match result {
            Ok(tokens) => {
                self.replace_collection(tokens, ticket.category);
                self.refresh();
                info!(
                    "Loaded {} tokens (#{}), {} visible",
                    self.tokens.len(),
                    ticket.seq,
                    self.visible.len()
                );
            },
            Err(e) => {
                warn!(
                    "Load #{} failed, keeping {} tokens: {}",
                    ticket.seq,
                    self.tokens.len(),
                    e
                );
                self.error = Some(e.to_string());
                self.publish();
            },
        }
        true
    }

    /// Fetch from `source` and replace the collection.
    pub async fn load(
        &mut self,
        source: &dyn TokenSource,
        category: Option<Category>,
    ) -> Result<&[Token], FetchError> {
        let ticket = self.begin_load(category);
        let result = source.fetch(category).await;
        let failure = result.as_ref().err().cloned();

        self.finish_load(ticket, result);

        match failure {
            Some(e) => Err(e),
            None => Ok(self.tokens.as_slice()),
        }
    }

    fn replace_collection(&mut self, tokens: Vec<Token>, category: Option<Category>) {
        self.tokens.clear();
        self.index.clear();

        for mut token in tokens {
            if category.is_some_and(|wanted| token.category != wanted) {
                continue;
            }
            if self.index.contains_key(&token.id) {
                debug!("Dropping duplicate token {}", token.id);
                continue;
            }
            if normalize_token(&mut token) {
                warn!("Repaired inconsistent fields on token {}", token.id);
            }
            self.index.insert(token.id.clone(), self.tokens.len());
            self.tokens.push(token);
        }
    }

    // ============================================
    // Record Updates
    // ============================================

    /// Apply one synthetic price tick from `source` to every record.
    ///
    /// Only price and 24h change are taken from the source; identity,
    /// category and migration progress are never touched. `last_update`
    /// never moves backwards.
    pub fn apply_price_tick(&mut self, source: &dyn TokenSource) -> &[Token] {
        let now = Utc::now();

        for next in source.next_tick(&self.tokens) {
            let Some(&idx) = self.index.get(&next.id) else {
                continue;
            };
            let token = &mut self.tokens[idx];

            if let Some(price) = validate_usd_price(next.price) {
                token.price = price;
            }
            if next.price_change_24h.is_finite() {
                token.price_change_24h = next.price_change_24h;
            }
        }

        for token in &mut self.tokens {
            token.last_update = token.last_update.max(now);
        }

        self.refresh();
        &self.tokens
    }

    /// Patch one record from a real-time update. Unknown ids are ignored.
    pub fn apply_price_update(&mut self, update: &PriceUpdate) -> bool {
        let Some(&idx) = self.index.get(&update.id) else {
            debug!("Ignoring price update for unknown token {}", update.id);
            return false;
        };
        let token = &mut self.tokens[idx];

        if let Some(price) = validate_usd_price(update.price) {
            token.price = price;
        }
        if let Some(change) = update.price_change_24h.filter(|c| c.is_finite()) {
            token.price_change_24h = change;
        }
        if let Some(volume) = update.volume_24h {
            token.volume_24h = validate_usd_amount(volume);
        }
        let stamp = update.timestamp.unwrap_or_else(Utc::now);
        token.last_update = token.last_update.max(stamp);

        self.refresh();
        true
    }

    /// Replace an existing record with the same id, keeping its category.
    /// Unknown ids are ignored.
    pub fn update_token(&mut self, mut token: Token) -> bool {
        let Some(&idx) = self.index.get(&token.id) else {
            debug!("Ignoring update for unknown token {}", token.id);
            return false;
        };

        let current = &self.tokens[idx];
        token.category = current.category;
        token.last_update = token.last_update.max(current.last_update);
        if normalize_token(&mut token) {
            warn!("Repaired inconsistent fields on token {}", token.id);
        }
        self.tokens[idx] = token;

        self.refresh();
        true
    }

    // ============================================
    // View Parameters
    // ============================================

    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.params.sort_field = field;
        self.params.sort_direction = direction;
        self.refresh();
    }

    /// Header click: the current field flips from descending to ascending,
    /// anything else sorts descending by `field`.
    pub fn toggle_sort(&mut self, field: SortField) {
        let direction = if self.params.sort_field == field
            && self.params.sort_direction == SortDirection::Desc
        {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        self.set_sort(field, direction);
    }

    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.params.category = filter;
        self.refresh();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.params.search = query.into();
        self.refresh();
    }

    /// Point the selection at a record, or clear it with `None`.
    ///
    /// Ids not in the collection are rejected and leave the selection as is.
    pub fn select_token(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if !self.index.contains_key(id) => {
                debug!("Ignoring selection of unknown token {}", id);
                false
            },
            _ => {
                self.selected = id.map(str::to_string);
                self.publish();
                true
            },
        }
    }

    /// Returns true if the flag changed.
    pub fn set_real_time_updates(&mut self, enabled: bool) -> bool {
        if self.real_time_updates == enabled {
            return false;
        }
        self.real_time_updates = enabled;
        self.publish();
        true
    }

    /// Returns the new value.
    pub fn toggle_real_time_updates(&mut self) -> bool {
        self.set_real_time_updates(!self.real_time_updates);
        self.real_time_updates
    }

    // ============================================
    // Accessors
    // ============================================

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn visible(&self) -> &[Token] {
        &self.visible
    }

    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn real_time_updates(&self) -> bool {
        self.real_time_updates
    }

    /// The selected record, if it is still in the collection.
    pub fn selected_token(&self) -> Option<&Token> {
        let id = self.selected.as_ref()?;
        self.index.get(id).map(|&idx| &self.tokens[idx])
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.index.get(id).map(|&idx| &self.tokens[idx])
    }

    /// Read-only subscription; the receiver always sees the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            visible: Arc::clone(&self.visible),
            loading: self.loading,
            error: self.error.clone(),
            selected: self.selected_token().cloned(),
            params: self.params.clone(),
            real_time_updates: self.real_time_updates,
            total: self.tokens.len(),
        }
    }

    fn refresh(&mut self) {
        self.visible = Arc::new(self.params.project(&self.tokens));
        self.publish();
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(ViewParams::default(), true)
    }
}
