//! Async pagination lifecycle for one connection query.
//!
//! `ConnectionQuery` encapsulates fetching, the loading / fetching-more
//! state machine, and completion ordering. Fetches run in spawned tasks
//! and deliver over a channel; the event loop calls `poll()` each tick to
//! apply completions on the single logical thread of control.
//!
//! Ordering rules:
//! - at most one request is in flight per query; a second fetch-more
//!   trigger is ignored or queued, per [`FetchMorePolicy`];
//! - every request carries a sequence number and the cache generation at
//!   issue time; a completion whose sequence is not the expected one, or
//!   whose generation predates a cache reset, is discarded unmerged.

use futures::future::BoxFuture;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cache::{CacheStore, ConnectionPage, Cursor, Entity, SignatureKey};
use crate::error::FetchError;
use crate::graphql::{ConnectionSpec, PageRequest};

/// What to do with a fetch-more trigger while one is already in flight.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchMorePolicy {
  /// Drop the second trigger.
  #[default]
  Ignore,
  /// Remember at most one pending trigger and issue it after the
  /// current fetch completes successfully.
  Queue,
}

/// Lifecycle of one paginated field state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
  /// No fetch issued yet.
  Uninitialized,
  /// First page in flight; nothing to render yet.
  Loading,
  /// Accumulated list is current; a fetch error, if any, is surfaced
  /// alongside it without touching the list.
  Ready,
  /// A subsequent page is in flight; the list stays visible.
  FetchingMore,
}

/// A factory for page-fetch futures, injected so tests can script pages.
type FetcherFn =
  Box<dyn Fn(PageRequest) -> BoxFuture<'static, Result<ConnectionPage, FetchError>> + Send + Sync>;

struct Completion {
  seq: u64,
  generation: u64,
  /// Merge target, resolved from the request itself: query name plus
  /// non-cursor variables, regardless of construction.
  signature: SignatureKey,
  request_cursor: Option<Cursor>,
  result: Result<ConnectionPage, FetchError>,
}

/// Driver for one paginated connection query.
pub struct ConnectionQuery {
  spec: ConnectionSpec,
  signature: SignatureKey,
  store: Arc<CacheStore>,
  fetcher: FetcherFn,
  policy: FetchMorePolicy,
  /// Build fetch-more requests with an explicitly supplied document
  /// instead of the spec's own. Both paths merge identically.
  explicit_document: bool,
  state: ConnectionState,
  error: Option<String>,
  next_seq: u64,
  expected_seq: Option<u64>,
  queued: bool,
  receiver: Option<mpsc::UnboundedReceiver<Completion>>,
}

impl ConnectionQuery {
  pub fn new<F, Fut>(
    spec: ConnectionSpec,
    store: Arc<CacheStore>,
    policy: FetchMorePolicy,
    explicit_document: bool,
    fetcher: F,
  ) -> Self
  where
    F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ConnectionPage, FetchError>> + Send + 'static,
  {
    let signature = spec.signature();
    Self {
      spec,
      signature,
      store,
      fetcher: Box::new(move |request| Box::pin(fetcher(request))),
      policy,
      explicit_document,
      state: ConnectionState::Uninitialized,
      error: None,
      next_seq: 0,
      expected_seq: None,
      queued: false,
      receiver: None,
    }
  }

  pub fn state(&self) -> ConnectionState {
    self.state
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn signature(&self) -> &SignatureKey {
    &self.signature
  }

  /// Accumulated entities in merged order.
  pub fn items(&self) -> Vec<Entity> {
    self.store.materialize(&self.signature)
  }

  pub fn has_next(&self) -> bool {
    self
      .store
      .paginated_state(&self.signature)
      .map(|s| s.has_next)
      .unwrap_or(false)
  }

  pub fn end_cursor(&self) -> Option<Cursor> {
    self
      .store
      .paginated_state(&self.signature)
      .and_then(|s| s.end_cursor)
  }

  pub fn pages_merged(&self) -> u64 {
    self
      .store
      .paginated_state(&self.signature)
      .map(|s| s.pages_merged)
      .unwrap_or(0)
  }

  pub fn last_merged_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
    self
      .store
      .paginated_state(&self.signature)
      .filter(|s| s.pages_merged > 0)
      .map(|s| s.last_merged_at)
  }

  /// Fetch the first page. No-op while any fetch is in flight.
  pub fn fetch_first(&mut self) {
    if self.is_in_flight() {
      return;
    }
    self.error = None;
    self.state = ConnectionState::Loading;
    self.issue(PageRequest::first(&self.spec));
  }

  /// Fetch the next page from the last known cursor.
  ///
  /// Ignored when nothing is loaded yet or the server reported no
  /// further pages. While a fetch is in flight the configured
  /// [`FetchMorePolicy`] applies.
  pub fn fetch_more(&mut self) {
    if self.is_in_flight() {
      if self.state == ConnectionState::FetchingMore && self.policy == FetchMorePolicy::Queue {
        self.queued = true;
      }
      return;
    }
    if self.state != ConnectionState::Ready || !self.has_next() {
      return;
    }
    let Some(cursor) = self.end_cursor() else {
      return;
    };

    let request = if self.explicit_document {
      PageRequest::more_with_document(self.spec.document_compact(), &self.spec, cursor)
    } else {
      PageRequest::more(&self.spec, cursor)
    };

    self.state = ConnectionState::FetchingMore;
    self.issue(request);
  }

  /// Forget all fetch bookkeeping after a cache reset. Any completion
  /// still in flight will be discarded by the generation check.
  pub fn on_reset(&mut self) {
    self.state = ConnectionState::Uninitialized;
    self.error = None;
    self.expected_seq = None;
    self.queued = false;
    self.receiver = None;
  }

  /// Apply at most one pending completion. Returns `true` if state
  /// changed. Call from the event loop tick.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };

    match receiver.try_recv() {
      Ok(completion) => {
        self.receiver = None;
        self.apply(completion);
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending; surface it like a failure
        self.receiver = None;
        self.expected_seq = None;
        self.state = ConnectionState::Ready;
        self.error = Some("fetch task dropped before completing".to_string());
        true
      }
    }
  }

  fn is_in_flight(&self) -> bool {
    self.expected_seq.is_some()
  }

  fn issue(&mut self, request: PageRequest) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.expected_seq = Some(seq);

    let generation = self.store.generation();
    let signature = request.signature();
    let request_cursor = request.cursor.clone();
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    debug!(
      seq,
      generation,
      cursor = request_cursor.as_ref().map(|c| c.as_str()),
      "issuing request"
    );

    let future = (self.fetcher)(request);
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped by a reset; nothing to do then
      let _ = tx.send(Completion {
        seq,
        generation,
        signature,
        request_cursor,
        result,
      });
    });
  }

  fn apply(&mut self, completion: Completion) {
    let expected = self.expected_seq.take();
    if expected != Some(completion.seq) {
      debug!(
        seq = completion.seq,
        ?expected,
        "discarding out-of-order completion"
      );
      self.expected_seq = expected;
      return;
    }
    if completion.generation != self.store.generation() {
      debug!(
        seq = completion.seq,
        generation = completion.generation,
        "discarding completion from before cache reset"
      );
      self.queued = false;
      self.state = ConnectionState::Uninitialized;
      return;
    }

    match completion.result {
      Ok(page) => {
        // The merge target comes from the request's own signature; the
        // invariant that it equals the spec's is what keeps every
        // construction path pointed at one paginated field state
        let outcome =
          self
            .store
            .apply_page(&completion.signature, completion.request_cursor.as_ref(), &page);
        info!(?outcome, nodes = page.nodes.len(), "merged page");
        self.state = ConnectionState::Ready;
        self.error = None;
        if std::mem::take(&mut self.queued) {
          self.fetch_more();
        }
      }
      Err(err) => {
        // The accumulated list is left untouched; a queued trigger is
        // dropped because its cursor can no longer be trusted
        self.queued = false;
        self.state = ConnectionState::Ready;
        self.error = Some(err.to_string());
      }
    }
  }
}

impl std::fmt::Debug for ConnectionQuery {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ConnectionQuery")
      .field("signature", &self.signature)
      .field("state", &self.state)
      .field("error", &self.error)
      .field("next_seq", &self.next_seq)
      .finish_non_exhaustive()
  }
}
