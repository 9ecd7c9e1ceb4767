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
//! Reply paths: from queryables back to queriers, and the pending queries of a session.
use crate::core::ZErrorKind;
use crate::handlers::Callback;
use crate::net::fabric::Fabric;
use crate::net::protocol::core::{ConsolidationMode, PeerId, ZInt};
use crate::net::protocol::message::ZenohMessage;
use crate::query::Reply;
use crate::sample::Sample;
use async_std::task;
use flume::Receiver;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Where the replies of a query dispatched by this session must be sent.
#[derive(Clone)]
pub(crate) enum ReplyRoute {
    /// The query was issued by this session.
    Local(Arc<QueryTable>),
    /// The query was issued by a remote peer.
    Remote {
        fabric: Arc<dyn Fabric>,
        origin: PeerId,
    },
}

impl ReplyRoute {
    pub(crate) async fn reply_data(&self, qid: ZInt, replier_id: PeerId, sample: Sample) {
        match self {
            ReplyRoute::Local(table) => table.reply_data(qid, replier_id, sample),
            ReplyRoute::Remote { fabric, origin } => {
                let msg = ZenohMessage::ReplyData {
                    qid,
                    replier_id,
                    sample,
                };
                if let Err(e) = fabric.send(origin, msg).await {
                    log::error!("Failed to send reply to query {} of {}: {}", qid, origin, e);
                }
            }
        }
    }

    pub(crate) async fn reply_final(&self, qid: ZInt) {
        match self {
            ReplyRoute::Local(table) => table.reply_final(qid),
            ReplyRoute::Remote { fabric, origin } => {
                if let Err(e) = fabric.send(origin, ZenohMessage::ReplyFinal { qid }).await {
                    log::error!(
                        "Failed to send final reply to query {} of {}: {}",
                        qid,
                        origin,
                        e
                    );
                }
            }
        }
    }
}

/// Forwards the replies sent through `rep_receiver` in order, then signals the end of the
/// replies once every sender is dropped.
///
/// Local replies are handed to the querier's callback, which may block: they are forwarded
/// from a blocking-friendly thread.
pub(crate) fn forward_replies(
    qid: ZInt,
    replier_id: PeerId,
    rep_receiver: Receiver<Sample>,
    route: ReplyRoute,
) {
    match route {
        ReplyRoute::Local(table) => {
            task::spawn_blocking(move || {
                while let Ok(sample) = rep_receiver.recv() {
                    table.reply_data(qid, replier_id, sample);
                }
                table.reply_final(qid);
            });
        }
        route => {
            task::spawn(async move {
                while let Ok(sample) = rep_receiver.recv_async().await {
                    route.reply_data(qid, replier_id, sample).await;
                }
                route.reply_final(qid).await;
            });
        }
    }
}

struct QueryState {
    nb_final: usize,
    consolidation: ConsolidationMode,
    replies: Option<HashMap<String, Reply>>,
    callback: Callback<Reply>,
}

impl QueryState {
    fn flush(self, qid: ZInt) {
        if let Some(replies) = self.replies {
            for (_, reply) in replies.into_iter() {
                (self.callback)(reply);
            }
        }
        log::trace!("Close query {}", qid);
    }
}

/// The queries issued by a session that still wait for replies.
pub(crate) struct QueryTable {
    queries: Mutex<HashMap<ZInt, QueryState>>,
}

impl QueryTable {
    pub(crate) fn new() -> QueryTable {
        QueryTable {
            queries: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a query waiting for `nb_final` final replies.
    ///
    /// A query that waits for none is completed right away.
    pub(crate) fn register(
        &self,
        qid: ZInt,
        nb_final: usize,
        consolidation: ConsolidationMode,
        callback: Callback<Reply>,
    ) {
        log::trace!("Register query {} ({} final(s) expected)", qid, nb_final);
        if nb_final == 0 {
            log::trace!("Close query {}", qid);
            return;
        }
        let replies = match consolidation {
            ConsolidationMode::None => None,
            ConsolidationMode::Latest => Some(HashMap::new()),
        };
        zlock!(self.queries).insert(
            qid,
            QueryState {
                nb_final,
                consolidation,
                replies,
                callback,
            },
        );
    }

    /// Delivers or consolidates a reply.
    ///
    /// The table lock is only held to look the query up: the querier's callback runs after
    /// it is released, so a slow consumer only delays its own query.
    pub(crate) fn reply_data(&self, qid: ZInt, replier_id: PeerId, sample: Sample) {
        log::trace!("recv ReplyData {} from {}: {}", qid, replier_id, sample);
        let callback = {
            let mut queries = zlock!(self.queries);
            let query = match queries.get_mut(&qid) {
                Some(query) => query,
                None => {
                    log::warn!("Received ReplyData for unknown Query: {}", qid);
                    return;
                }
            };
            match (query.consolidation, query.replies.as_mut()) {
                (ConsolidationMode::Latest, Some(replies)) => {
                    let newer = match replies.get(sample.key_expr.as_str()) {
                        Some(Reply {
                            sample: Ok(known), ..
                        }) => sample.timestamp > known.timestamp,
                        _ => true,
                    };
                    if newer {
                        replies.insert(
                            sample.key_expr.to_string(),
                            Reply {
                                sample: Ok(sample),
                                replier_id,
                            },
                        );
                    }
                    return;
                }
                _ => query.callback.clone(),
            }
        };
        callback(Reply {
            sample: Ok(sample),
            replier_id,
        });
    }

    pub(crate) fn reply_final(&self, qid: ZInt) {
        log::trace!("recv ReplyFinal {}", qid);
        let completed = {
            let mut queries = zlock!(self.queries);
            match queries.get_mut(&qid) {
                Some(query) => {
                    query.nb_final = query.nb_final.saturating_sub(1);
                    if query.nb_final == 0 {
                        queries.remove(&qid)
                    } else {
                        None
                    }
                }
                None => {
                    log::warn!("Received ReplyFinal for unknown Query: {}", qid);
                    None
                }
            }
        };
        if let Some(query) = completed {
            query.flush(qid);
        }
    }

    /// Closes a query that has not completed yet, delivering a timeout error after the
    /// replies already received.
    pub(crate) fn timeout(&self, qid: ZInt, local_pid: PeerId) {
        let expired = zlock!(self.queries).remove(&qid);
        if let Some(query) = expired {
            log::warn!(
                "Timeout on query {}: {} final(s) missing",
                qid,
                query.nb_final
            );
            let callback = query.callback.clone();
            query.flush(qid);
            callback(Reply {
                sample: Err(ZErrorKind::Timeout { qid }),
                replier_id: local_pid,
            });
        }
    }

    pub(crate) fn len(&self) -> usize {
        zlock!(self.queries).len()
    }

    /// Drops every pending query: their receivers observe the end of the replies.
    pub(crate) fn close(&self) {
        let pending: Vec<(ZInt, QueryState)> = zlock!(self.queries).drain().collect();
        for (qid, _) in pending {
            log::debug!("Close pending query {}", qid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn collector() -> (Callback<Reply>, flume::Receiver<Reply>) {
        let (tx, rx) = flume::unbounded();
        (
            Arc::new(move |reply: Reply| {
                let _ = tx.send(reply);
            }),
            rx,
        )
    }

    fn sample(key_expr: &str, value: &str, hlc: &uhlc::HLC) -> Sample {
        Sample::try_from(key_expr, value)
            .unwrap()
            .with_timestamp(hlc.new_timestamp())
    }

    #[test]
    fn replies_are_delivered_until_last_final() {
        let table = QueryTable::new();
        let hlc = uhlc::HLC::default();
        let (callback, replies) = collector();
        let pid = PeerId::rand();
        table.register(1, 2, ConsolidationMode::None, callback);
        table.reply_data(1, pid, sample("a/b", "1", &hlc));
        table.reply_final(1);
        assert_eq!(table.len(), 1);
        table.reply_data(1, pid, sample("a/b", "2", &hlc));
        table.reply_final(1);
        assert_eq!(table.len(), 0);
        let values: Vec<String> = replies
            .iter()
            .map(|reply| reply.sample.unwrap().value.to_string())
            .collect();
        assert_eq!(values, vec!["1", "2"]);
        // Late messages are ignored.
        table.reply_final(1);
        table.reply_data(1, pid, sample("a/b", "3", &hlc));
    }

    #[test]
    fn latest_consolidation_keeps_newest_per_key() {
        let table = QueryTable::new();
        let hlc = uhlc::HLC::default();
        let (callback, replies) = collector();
        let pid = PeerId::rand();
        table.register(2, 1, ConsolidationMode::Latest, callback);
        let older = sample("a/b", "old", &hlc);
        let newer = sample("a/b", "new", &hlc);
        table.reply_data(2, pid, newer);
        table.reply_data(2, pid, older);
        table.reply_data(2, pid, sample("a/c", "other", &hlc));
        assert!(replies.try_recv().is_err());
        table.reply_final(2);
        let mut values: Vec<String> = replies
            .iter()
            .map(|reply| reply.sample.unwrap().value.to_string())
            .collect();
        values.sort();
        assert_eq!(values, vec!["new", "other"]);
    }

    #[test]
    fn timeout_closes_pending_query() {
        let table = QueryTable::new();
        let hlc = uhlc::HLC::default();
        let (callback, replies) = collector();
        let pid = PeerId::rand();
        table.register(3, 2, ConsolidationMode::None, callback);
        table.reply_data(3, pid, sample("a/b", "1", &hlc));
        table.reply_final(3);
        table.timeout(3, pid);
        assert_eq!(table.len(), 0);
        let received: Vec<Reply> = replies.iter().collect();
        assert_eq!(received.len(), 2);
        assert!(received[0].sample.is_ok());
        assert!(matches!(
            received[1].sample,
            Err(ZErrorKind::Timeout { qid: 3 })
        ));
        // A completed query is never timed out.
        table.timeout(3, pid);
    }

    #[test]
    fn callbacks_run_outside_the_table_lock() {
        let table = Arc::new(QueryTable::new());
        let hlc = uhlc::HLC::default();
        let pid = PeerId::rand();
        let (tx, rx) = flume::unbounded();
        let c_table = Arc::downgrade(&table);
        table.register(
            5,
            1,
            ConsolidationMode::None,
            Arc::new(move |reply: Reply| {
                // A reply callback issuing another query.
                if let Some(table) = c_table.upgrade() {
                    table.register(6, 1, ConsolidationMode::None, Arc::new(|_: Reply| {}));
                    let _ = tx.send((reply, table.len()));
                }
            }),
        );
        table.reply_data(5, pid, sample("a/b", "1", &hlc));
        let (reply, pending) = rx.try_recv().unwrap();
        assert!(reply.sample.is_ok());
        assert_eq!(pending, 2);
        table.reply_final(5);
        assert_eq!(table.len(), 1);
        table.timeout(6, pid);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn query_without_target_completes_immediately() {
        let table = QueryTable::new();
        let (callback, replies) = collector();
        table.register(4, 0, ConsolidationMode::None, callback);
        assert_eq!(table.len(), 0);
        assert!(replies.recv().is_err());
    }
}
