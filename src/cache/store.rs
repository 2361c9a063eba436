//! In-memory normalized cache store.
//!
//! Two maps: entity identity → entity, and query signature → accumulated
//! pagination state. All operations are synchronous and only mutate the
//! store. A generation counter increments on every full reset so that
//! completions issued before a reset can be recognized and discarded.

use std::collections::HashMap;
use std::sync::Mutex;

use super::entity::{Entity, EntityId};
use super::merge::{merge_page, MergeOutcome, PaginatedFieldState};
use super::page::{ConnectionPage, Cursor};
use super::signature::SignatureKey;

#[derive(Debug, Default)]
struct Inner {
  entities: HashMap<EntityId, Entity>,
  paginated: HashMap<SignatureKey, PaginatedFieldState>,
  generation: u64,
}

/// Normalized cache: entities by identity, ordered id lists by signature.
#[derive(Debug, Default)]
pub struct CacheStore {
  inner: Mutex<Inner>,
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Look up a single entity by identity.
  #[allow(dead_code)]
  pub fn entity(&self, id: &EntityId) -> Option<Entity> {
    self.lock().entities.get(id).cloned()
  }

  /// Insert or update an entity, merging fields last-write-wins.
  #[allow(dead_code)]
  pub fn put_entity(&self, entity: &Entity) {
    Self::upsert(&mut self.lock(), entity);
  }

  /// Current pagination state for a signature, if any page was merged.
  pub fn paginated_state(&self, signature: &SignatureKey) -> Option<PaginatedFieldState> {
    self.lock().paginated.get(signature).cloned()
  }

  /// Replace the pagination state for a signature wholesale. Normal
  /// operation goes through [`CacheStore::apply_page`]; this exists for
  /// callers that need to restore a previously captured state.
  #[allow(dead_code)]
  pub fn set_paginated_state(&self, signature: &SignatureKey, state: PaginatedFieldState) {
    self.lock().paginated.insert(signature.clone(), state);
  }

  /// Normalize a fetched page into the store and merge its id list into
  /// the signature's accumulated state.
  ///
  /// Entity fields always land in the entity map, duplicate delivery or
  /// not; the id list and cursor bookkeeping follow the merge rules in
  /// [`merge_page`].
  pub fn apply_page(
    &self,
    signature: &SignatureKey,
    request_cursor: Option<&Cursor>,
    page: &ConnectionPage,
  ) -> MergeOutcome {
    let mut inner = self.lock();
    for node in &page.nodes {
      Self::upsert(&mut inner, node);
    }
    let state = inner.paginated.entry(signature.clone()).or_default();
    merge_page(state, request_cursor, page)
  }

  /// Accumulated entities for a signature, in merged order.
  pub fn materialize(&self, signature: &SignatureKey) -> Vec<Entity> {
    let inner = self.lock();
    let Some(state) = inner.paginated.get(signature) else {
      return Vec::new();
    };
    state
      .ids
      .iter()
      .filter_map(|id| inner.entities.get(id).cloned())
      .collect()
  }

  /// Drop all cached data and bump the generation counter.
  pub fn reset(&self) {
    let mut inner = self.lock();
    inner.entities.clear();
    inner.paginated.clear();
    inner.generation += 1;
  }

  /// Generation at this moment; recorded per request and compared on
  /// completion to discard results that straddled a reset.
  pub fn generation(&self) -> u64 {
    self.lock().generation
  }

  fn upsert(inner: &mut Inner, entity: &Entity) {
    match inner.entities.get_mut(&entity.id) {
      Some(existing) => existing.merge_fields(&entity.fields),
      None => {
        inner.entities.insert(entity.id.clone(), entity.clone());
      }
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    // A poisoned lock means a panic mid-mutation; propagating the panic
    // is the only sound option for an in-memory store.
    self.inner.lock().expect("cache store lock poisoned")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  fn node(id: &str, name: &str) -> Entity {
    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), name.to_string());
    Entity::new(id, fields)
  }

  fn page(nodes: Vec<Entity>, end: Option<&str>, has_next: bool) -> ConnectionPage {
    ConnectionPage {
      nodes,
      end_cursor: end.map(Cursor::new),
      has_next,
    }
  }

  fn signature() -> SignatureKey {
    SignatureKey::derive("projects", &BTreeMap::new())
  }

  #[test]
  fn test_apply_page_normalizes_and_materializes_in_order() {
    let store = CacheStore::new();
    let sig = signature();

    store.apply_page(&sig, None, &page(vec![node("A", "alpha")], Some("c1"), true));
    store.apply_page(
      &sig,
      Some(&Cursor::new("c1")),
      &page(vec![node("B", "beta")], Some("c2"), false),
    );

    let items = store.materialize(&sig);
    let names: Vec<&str> = items.iter().filter_map(|e| e.field("name")).collect();
    assert_eq!(names, vec!["alpha", "beta"]);

    let state = store.paginated_state(&sig).unwrap();
    assert_eq!(state.end_cursor, Some(Cursor::new("c2")));
    assert!(!state.has_next);
  }

  #[test]
  fn test_refetched_entity_updates_fields_without_duplicating() {
    let store = CacheStore::new();
    let sig = signature();

    store.apply_page(&sig, None, &page(vec![node("A", "alpha")], Some("c1"), true));
    // Same entity comes back in a later page with fresher fields
    store.apply_page(
      &sig,
      Some(&Cursor::new("c1")),
      &page(vec![node("A", "alpha v2"), node("B", "beta")], None, false),
    );

    let items = store.materialize(&sig);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].field("name"), Some("alpha v2"));
  }

  #[test]
  fn test_duplicate_delivery_still_refreshes_entity_fields() {
    let store = CacheStore::new();
    let sig = signature();

    store.apply_page(&sig, None, &page(vec![node("A", "alpha")], Some("c1"), true));
    store.apply_page(
      &sig,
      Some(&Cursor::new("c1")),
      &page(vec![node("B", "beta")], Some("c2"), true),
    );
    // Duplicate delivery of the c1 page: list untouched, fields land
    let outcome = store.apply_page(
      &sig,
      Some(&Cursor::new("c1")),
      &page(vec![node("B", "beta v2")], Some("c2"), true),
    );

    assert_eq!(outcome, MergeOutcome::Duplicate);
    let items = store.materialize(&sig);
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].field("name"), Some("beta v2"));
  }

  #[test]
  fn test_reset_evicts_and_bumps_generation() {
    let store = CacheStore::new();
    let sig = signature();

    store.apply_page(&sig, None, &page(vec![node("A", "alpha")], Some("c1"), true));
    assert_eq!(store.generation(), 0);

    store.reset();

    assert_eq!(store.generation(), 1);
    assert!(store.paginated_state(&sig).is_none());
    assert!(store.entity(&EntityId::from("A")).is_none());
    assert!(store.materialize(&sig).is_empty());
  }

  #[test]
  fn test_put_and_get_entity() {
    let store = CacheStore::new();
    store.put_entity(&node("A", "alpha"));
    store.put_entity(&node("A", "alpha v2"));

    let entity = store.entity(&EntityId::from("A")).unwrap();
    assert_eq!(entity.field("name"), Some("alpha v2"));
  }

  #[test]
  fn test_set_paginated_state_restores_captured_state() {
    let store = CacheStore::new();
    let sig = signature();

    store.apply_page(&sig, None, &page(vec![node("A", "alpha")], Some("c1"), true));
    let captured = store.paginated_state(&sig).unwrap();

    store.apply_page(
      &sig,
      Some(&Cursor::new("c1")),
      &page(vec![node("B", "beta")], Some("c2"), false),
    );
    store.set_paginated_state(&sig, captured.clone());

    assert_eq!(store.paginated_state(&sig), Some(captured));
  }
}
