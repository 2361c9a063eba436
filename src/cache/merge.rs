//! Page merge engine: folds a freshly fetched page into the accumulated
//! state for one signature.
//!
//! Invariants the merge maintains:
//! - the accumulated id list never contains duplicates;
//! - previously merged ids keep their positions (first-seen order across
//!   pages, not the order of any single response);
//! - merging the same delivery twice leaves the state identical to
//!   merging it once.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::entity::EntityId;
use super::page::{ConnectionPage, Cursor};

/// Accumulated pagination state for one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedFieldState {
  /// Entity ids in first-seen order across all merged pages.
  pub ids: Vec<EntityId>,
  /// Cursor to request the next page with.
  pub end_cursor: Option<Cursor>,
  /// Whether the server reported further pages.
  pub has_next: bool,
  /// The request cursor of the most recently merged delivery. `None`
  /// means the first page (requested without a cursor) was the last one
  /// merged.
  last_request_cursor: Option<Cursor>,
  /// Number of non-duplicate deliveries merged so far.
  pub pages_merged: u64,
  /// When the last non-duplicate delivery was merged.
  pub last_merged_at: DateTime<Utc>,
}

impl PaginatedFieldState {
  pub fn new() -> Self {
    Self {
      ids: Vec::new(),
      end_cursor: None,
      has_next: false,
      last_request_cursor: None,
      pages_merged: 0,
      last_merged_at: Utc::now(),
    }
  }
}

impl Default for PaginatedFieldState {
  fn default() -> Self {
    Self::new()
  }
}

/// What `merge_page` did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
  /// The page was merged; `appended` ids were new to the list.
  Merged { appended: usize },
  /// The delivery repeated the most recently merged request cursor and
  /// was ignored (idempotence under duplicate delivery).
  Duplicate,
}

/// Merge one delivery into `state`.
///
/// `request_cursor` is the cursor the page was requested with (`None` for
/// the first page). A delivery whose request cursor equals the one most
/// recently merged is a duplicate: the list and cursor bookkeeping stay
/// untouched. Otherwise the page's ids are appended in their relative
/// order, skipping ids already present, and the continuation cursor and
/// has-next flag advance. An empty page still advances them, since the
/// server genuinely answered.
pub fn merge_page(
  state: &mut PaginatedFieldState,
  request_cursor: Option<&Cursor>,
  page: &ConnectionPage,
) -> MergeOutcome {
  if state.pages_merged > 0 && request_cursor == state.last_request_cursor.as_ref() {
    return MergeOutcome::Duplicate;
  }

  let mut seen: HashSet<&EntityId> = state.ids.iter().collect();
  let mut fresh: Vec<EntityId> = Vec::new();
  for node in &page.nodes {
    if seen.contains(&node.id) {
      continue;
    }
    fresh.push(node.id.clone());
    // Guard against a duplicate id within the same response
    seen.insert(&node.id);
  }

  let appended = fresh.len();
  state.ids.extend(fresh);
  state.end_cursor = page.end_cursor.clone();
  state.has_next = page.has_next;
  state.last_request_cursor = request_cursor.cloned();
  state.pages_merged += 1;
  state.last_merged_at = Utc::now();

  MergeOutcome::Merged { appended }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::entity::Entity;
  use std::collections::BTreeMap;

  fn node(id: &str) -> Entity {
    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), format!("node {}", id));
    Entity::new(id, fields)
  }

  fn page(ids: &[&str], end: Option<&str>, has_next: bool) -> ConnectionPage {
    ConnectionPage {
      nodes: ids.iter().map(|id| node(id)).collect(),
      end_cursor: end.map(Cursor::new),
      has_next,
    }
  }

  fn id_strs(state: &PaginatedFieldState) -> Vec<&str> {
    state.ids.iter().map(|id| id.as_str()).collect()
  }

  #[test]
  fn test_pages_accumulate_in_first_seen_order() {
    let mut state = PaginatedFieldState::new();
    merge_page(&mut state, None, &page(&["A"], Some("c1"), true));
    merge_page(
      &mut state,
      Some(&Cursor::new("c1")),
      &page(&["B", "C"], Some("c2"), false),
    );

    assert_eq!(id_strs(&state), vec!["A", "B", "C"]);
    assert_eq!(state.end_cursor, Some(Cursor::new("c2")));
    assert!(!state.has_next);
    assert_eq!(state.pages_merged, 2);
  }

  #[test]
  fn test_overlapping_page_dedupes_without_reordering() {
    let mut state = PaginatedFieldState::new();
    merge_page(&mut state, None, &page(&["A", "B"], Some("c1"), true));
    // Server shifted its window; B comes back again ahead of C
    let outcome = merge_page(
      &mut state,
      Some(&Cursor::new("c1")),
      &page(&["B", "C"], Some("c2"), true),
    );

    assert_eq!(outcome, MergeOutcome::Merged { appended: 1 });
    assert_eq!(id_strs(&state), vec!["A", "B", "C"]);
  }

  #[test]
  fn test_duplicate_delivery_is_idempotent() {
    let mut state = PaginatedFieldState::new();
    merge_page(&mut state, None, &page(&["A"], Some("c1"), true));
    merge_page(
      &mut state,
      Some(&Cursor::new("c1")),
      &page(&["B"], Some("c2"), true),
    );
    let before = state.clone();

    let outcome = merge_page(
      &mut state,
      Some(&Cursor::new("c1")),
      &page(&["B"], Some("c2"), true),
    );

    assert_eq!(outcome, MergeOutcome::Duplicate);
    assert_eq!(state, before);
  }

  #[test]
  fn test_duplicate_ids_within_one_response() {
    let mut state = PaginatedFieldState::new();
    let outcome = merge_page(&mut state, None, &page(&["A", "A", "B"], Some("c1"), true));

    assert_eq!(outcome, MergeOutcome::Merged { appended: 2 });
    assert_eq!(id_strs(&state), vec!["A", "B"]);
  }

  #[test]
  fn test_empty_page_leaves_list_but_advances_cursor() {
    let mut state = PaginatedFieldState::new();
    merge_page(&mut state, None, &page(&["A"], Some("c1"), true));
    let outcome = merge_page(
      &mut state,
      Some(&Cursor::new("c1")),
      &page(&[], Some("c2"), false),
    );

    assert_eq!(outcome, MergeOutcome::Merged { appended: 0 });
    assert_eq!(id_strs(&state), vec!["A"]);
    assert_eq!(state.end_cursor, Some(Cursor::new("c2")));
    assert!(!state.has_next);
  }

  #[test]
  fn test_first_page_refetch_after_reset_is_not_duplicate() {
    // A fresh state must accept a cursorless first page even though its
    // last_request_cursor field is also None.
    let mut state = PaginatedFieldState::new();
    let outcome = merge_page(&mut state, None, &page(&["A"], Some("c1"), true));
    assert_eq!(outcome, MergeOutcome::Merged { appended: 1 });
  }
}
