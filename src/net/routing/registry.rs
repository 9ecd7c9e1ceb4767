//
// Copyright (c) 2022 ZettaScale Technology
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ZettaScale Zenoh Team, <zenoh@zettascale.tech>
//
use crate::core::{ZErrorKind, ZResult};
use crate::handlers::Callback;
use crate::key_expr::KeyExpr;
use crate::net::protocol::core::Id;
use crate::queryable::{Query, QueryableState};
use std::collections::HashMap;
use async_std::sync::RwLock as AsyncRwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

struct RegistryInner {
    queryables: HashMap<Id, Arc<QueryableState>>,
    closed: bool,
}

/// The queryables declared in a session.
///
/// Lookups work on a snapshot taken under the read lock: a queryable undeclared while a
/// query is being dispatched may still receive it, but its replies are refused.
pub(crate) struct QueryableRegistry {
    decl_id_counter: AtomicUsize,
    inner: RwLock<RegistryInner>,
}

impl QueryableRegistry {
    pub(crate) fn new() -> QueryableRegistry {
        QueryableRegistry {
            decl_id_counter: AtomicUsize::new(0),
            inner: RwLock::new(RegistryInner {
                queryables: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Registers a new queryable. Ids are never reused within a registry.
    pub(crate) fn declare(
        &self,
        key_expr: KeyExpr,
        complete: bool,
        callback: Callback<Query>,
    ) -> ZResult<Arc<QueryableState>> {
        let mut inner = zwrite!(self.inner);
        if inner.closed {
            return zerror!(ZErrorKind::SessionClosed);
        }
        let id = self.decl_id_counter.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(QueryableState {
            id,
            key_expr,
            complete,
            alive: Arc::new(AsyncRwLock::new(true)),
            callback,
        });
        log::debug!("Declare {:?}", state);
        inner.queryables.insert(id, state.clone());
        Ok(state)
    }

    /// Removes a queryable. Undeclaring an unknown or already undeclared id does nothing.
    ///
    /// Returns once the replies its `Query`s were enqueueing are enqueued.
    pub(crate) fn undeclare(&self, id: Id) {
        let removed = zwrite!(self.inner).queryables.remove(&id);
        match removed {
            Some(state) => {
                state.kill();
                log::debug!("Undeclare {:?}", state);
            }
            None => log::trace!("Undeclare unknown queryable {}", id),
        }
    }

    /// The live queryables whose key expression intersects `key_expr`.
    pub(crate) fn matching(&self, key_expr: &KeyExpr) -> Vec<Arc<QueryableState>> {
        zread!(self.inner)
            .queryables
            .values()
            .filter(|qable| qable.is_alive() && qable.key_expr.intersects(key_expr))
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        zread!(self.inner).queryables.len()
    }

    /// Undeclares every queryable and refuses further declarations.
    pub(crate) fn close(&self) {
        let drained: Vec<Arc<QueryableState>> = {
            let mut inner = zwrite!(self.inner);
            inner.closed = true;
            inner.queryables.drain().map(|(_, state)| state).collect()
        };
        for state in drained {
            state.kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryInto;

    fn ke(s: &str) -> KeyExpr {
        s.try_into().unwrap()
    }

    fn noop() -> Callback<Query> {
        Arc::new(|_: Query| {})
    }

    fn matching_ids(registry: &QueryableRegistry, key_expr: &str) -> Vec<Id> {
        let mut ids: Vec<Id> = registry
            .matching(&ke(key_expr))
            .iter()
            .map(|qable| qable.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn single_wildcard_matches_one_chunk() {
        let registry = QueryableRegistry::new();
        let qable = registry.declare(ke("a/*"), true, noop()).unwrap();
        assert_eq!(matching_ids(&registry, "a/b"), vec![qable.id]);
        assert!(matching_ids(&registry, "a/b/c").is_empty());
    }

    #[test]
    fn double_wildcard_matches_many_chunks() {
        let registry = QueryableRegistry::new();
        let any = registry.declare(ke("a/**"), false, noop()).unwrap();
        let exact = registry.declare(ke("a/b"), true, noop()).unwrap();
        assert_ne!(any.id, exact.id);
        assert_eq!(matching_ids(&registry, "a/b"), vec![any.id, exact.id]);
        assert_eq!(matching_ids(&registry, "a/b/c"), vec![any.id]);
        assert_eq!(matching_ids(&registry, "a/*"), vec![any.id, exact.id]);
        assert!(matching_ids(&registry, "b").is_empty());
    }

    #[test]
    fn undeclared_queryables_never_match() {
        let registry = QueryableRegistry::new();
        let qable = registry.declare(ke("a/b"), true, noop()).unwrap();
        assert_eq!(registry.len(), 1);
        registry.undeclare(qable.id);
        assert!(!qable.is_alive());
        assert_eq!(registry.len(), 0);
        assert!(matching_ids(&registry, "a/b").is_empty());
        // Undeclaring twice is a no-op.
        registry.undeclare(qable.id);
        registry.undeclare(1234);
        // Ids are not reused.
        let other = registry.declare(ke("a/b"), true, noop()).unwrap();
        assert_ne!(other.id, qable.id);
    }

    #[test]
    fn closed_registry_refuses_declarations() {
        let registry = QueryableRegistry::new();
        let qable = registry.declare(ke("a/b"), true, noop()).unwrap();
        registry.close();
        assert!(!qable.is_alive());
        assert_eq!(registry.len(), 0);
        let err = registry.declare(ke("a/b"), true, noop()).unwrap_err();
        assert_eq!(err.kind(), &ZErrorKind::SessionClosed);
    }

    #[test]
    fn undeclare_waits_for_replies_being_enqueued() {
        use crate::sample::Sample;
        use std::time::Duration;

        let registry = Arc::new(QueryableRegistry::new());
        let qable = registry.declare(ke("a/b"), true, noop()).unwrap();
        let (replies_sender, replies) = flume::bounded(1);
        let query = Arc::new(Query {
            key_expr: ke("a/b"),
            value_selector: String::new(),
            qid: 0,
            queryable_id: qable.id,
            queryable_alive: qable.alive.clone(),
            replies_sender,
            hlc: None,
        });
        query.reply(Sample::try_from("a/b", "first").unwrap()).unwrap();

        // The channel is full: this reply blocks while holding the alive flag.
        let c_query = query.clone();
        let in_flight =
            std::thread::spawn(move || c_query.reply(Sample::try_from("a/b", "second").unwrap()));
        std::thread::sleep(Duration::from_millis(200));

        let (undeclared_tx, undeclared_rx) = flume::bounded(1);
        let c_registry = registry.clone();
        let id = qable.id;
        std::thread::spawn(move || {
            c_registry.undeclare(id);
            undeclared_tx.send(()).unwrap();
        });
        assert!(undeclared_rx
            .recv_timeout(Duration::from_millis(300))
            .is_err());

        assert_eq!(replies.recv().unwrap().value.to_string(), "first");
        assert!(in_flight.join().unwrap().is_ok());
        assert_eq!(replies.recv().unwrap().value.to_string(), "second");
        undeclared_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert!(matches!(
            query.reply(Sample::try_from("a/b", "third").unwrap()),
            Err(e) if matches!(e.kind(), ZErrorKind::UndeclaredQueryable { .. })
        ));
        assert!(replies.try_recv().is_err());
    }
}
