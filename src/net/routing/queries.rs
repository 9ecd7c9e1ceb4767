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
//! Query routing: selection of the targets of a query and dispatch to them.
use super::registry::QueryableRegistry;
use crate::key_expr::KeyExpr;
use crate::net::protocol::core::{QueryTarget, ZInt};
use crate::queryable::{Query, QueryableState};
use crate::sample::Sample;
use async_std::task;
use flume::Sender;
use std::sync::Arc;
use uhlc::HLC;

/// Selects the queryables of `registry` a query on `key_expr` should be dispatched to.
pub(crate) fn route(
    registry: &QueryableRegistry,
    key_expr: &KeyExpr,
    target: QueryTarget,
) -> Vec<Arc<QueryableState>> {
    let matching = registry.matching(key_expr);
    let targets = match target {
        QueryTarget::All => matching,
        QueryTarget::AllComplete => matching
            .into_iter()
            .filter(|qable| qable.complete && qable.key_expr.includes(key_expr))
            .collect(),
        QueryTarget::BestMatching => {
            let best = matching
                .iter()
                .filter(|qable| qable.complete && qable.key_expr.includes(key_expr))
                .min_by_key(|qable| qable.id)
                .cloned();
            match best {
                Some(best) => vec![best],
                None => matching,
            }
        }
    };
    log::trace!(
        "Route query on {} ({:?}) to {} queryable(s)",
        key_expr,
        target,
        targets.len()
    );
    targets
}

/// Hands a [`Query`] to each target, each on its own blocking-friendly thread.
///
/// Every `Query` holds a clone of `rep_sender`: once all of them are dropped, the reply
/// stream is over. Returns the number of queryables the query was dispatched to.
pub(crate) fn dispatch(
    targets: Vec<Arc<QueryableState>>,
    key_expr: &KeyExpr,
    value_selector: &str,
    qid: ZInt,
    rep_sender: Sender<Sample>,
    hlc: Option<Arc<HLC>>,
) -> usize {
    let nb_targets = targets.len();
    for qable in targets {
        let query = Query {
            key_expr: key_expr.clone(),
            value_selector: value_selector.to_string(),
            qid,
            queryable_id: qable.id,
            queryable_alive: qable.alive.clone(),
            replies_sender: rep_sender.clone(),
            hlc: hlc.clone(),
        };
        let callback = qable.callback.clone();
        task::spawn_blocking(move || callback(query));
    }
    nb_targets
}
