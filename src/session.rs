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
use crate::config::Config;
use crate::core::{AsyncResolve, Resolvable, SyncResolve, ZError, ZErrorKind, ZResult};
use crate::handlers::{Callback, DefaultHandler};
use crate::key_expr::{parse_key_expr, KeyExpr};
use crate::net::fabric::{Fabric, LocalHub};
use crate::net::protocol::core::{ConsolidationMode, PeerId, QueryTarget, ZInt};
use crate::net::protocol::message::ZenohMessage;
use crate::net::routing::queries::{dispatch, route};
use crate::net::routing::registry::QueryableRegistry;
use crate::net::routing::reply::{forward_replies, QueryTable, ReplyRoute};
use crate::query::{GetBuilder, Reply};
use crate::queryable::QueryableBuilder;
use crate::selector::{split_selector, Selector};
use crate::API_REPLY_EMISSION_CHANNEL_SIZE;
use crate::{API_QUERY_RECEPTION_CHANNEL_SIZE, API_REPLY_RECEPTION_CHANNEL_SIZE};
use async_std::task;
use futures::future::BoxFuture;
use std::convert::TryInto;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uhlc::HLC;

pub(crate) struct SessionInner {
    pid: PeerId,
    local_routing: bool,
    queries_default_timeout: Duration,
    hlc: Option<Arc<HLC>>,
    fabric: Arc<dyn Fabric>,
    pub(crate) registry: Arc<QueryableRegistry>,
    queries: Arc<QueryTable>,
    qid_counter: AtomicU64,
    alive: AtomicBool,
}

impl SessionInner {
    fn handle_message(&self, origin: PeerId, msg: ZenohMessage) {
        match msg {
            ZenohMessage::Query {
                key_expr,
                value_selector,
                qid,
                target,
                ..
            } => {
                log::trace!(
                    "recv Query {} from {}: {}?{}",
                    qid,
                    origin,
                    key_expr,
                    value_selector
                );
                if let Err(e) = self.handle_query(origin, &key_expr, &value_selector, qid, target)
                {
                    log::error!("Received Query {} from {} with {}", qid, origin, e);
                }
            }
            ZenohMessage::ReplyData {
                qid,
                replier_id,
                sample,
            } => self.queries.reply_data(qid, replier_id, sample),
            ZenohMessage::ReplyFinal { qid } => self.queries.reply_final(qid),
        }
    }

    fn reply_route(&self, origin: PeerId) -> ReplyRoute {
        if origin == self.pid {
            ReplyRoute::Local(self.queries.clone())
        } else {
            ReplyRoute::Remote {
                fabric: self.fabric.clone(),
                origin,
            }
        }
    }

    /// Parses an inbound query and routes it to the local queryables.
    ///
    /// A query with an invalid key expression is answered with a final reply only.
    fn handle_query(
        &self,
        origin: PeerId,
        raw_key_expr: &str,
        value_selector: &str,
        qid: ZInt,
        target: QueryTarget,
    ) -> ZResult<usize> {
        let key_expr = match parse_key_expr(raw_key_expr) {
            Ok(key_expr) => key_expr,
            Err(e) => {
                let reply_route = self.reply_route(origin);
                task::spawn(async move { reply_route.reply_final(qid).await });
                return Err(e);
            }
        };
        Ok(self.route_query(origin, &key_expr, value_selector, qid, target))
    }

    fn route_query(
        &self,
        origin: PeerId,
        key_expr: &KeyExpr,
        value_selector: &str,
        qid: ZInt,
        target: QueryTarget,
    ) -> usize {
        let targets = route(&self.registry, key_expr, target);
        let (rep_sender, rep_receiver) = flume::bounded(*API_REPLY_EMISSION_CHANNEL_SIZE);
        let nb_targets = dispatch(
            targets,
            key_expr,
            value_selector,
            qid,
            rep_sender,
            self.hlc.clone(),
        );
        forward_replies(qid, self.pid, rep_receiver, self.reply_route(origin));
        nb_targets
    }

    async fn close(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        log::debug!("Close session {}", self.pid);
        self.registry.close();
        self.queries.close();
        self.fabric.close().await;
    }
}

/// A zenoh session: declares queryables and issues queries over a [`Fabric`].
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn new(config: Config, fabric: Arc<dyn Fabric>) -> Session {
        let pid = fabric.pid();
        let hlc = if config.add_timestamp {
            Some(Arc::new(HLC::default()))
        } else {
            None
        };
        let inner = Arc::new(SessionInner {
            pid,
            local_routing: config.local_routing,
            queries_default_timeout: config.queries_default_timeout(),
            hlc,
            fabric,
            registry: Arc::new(QueryableRegistry::new()),
            queries: Arc::new(QueryTable::new()),
            qid_counter: AtomicU64::new(0),
            alive: AtomicBool::new(true),
        });
        Session::start_rx(&inner);
        log::debug!("New session {} (local routing: {})", pid, config.local_routing);
        Session { inner }
    }

    fn start_rx(inner: &Arc<SessionInner>) {
        let fabric = inner.fabric.clone();
        let session = Arc::downgrade(inner);
        task::spawn(async move {
            while let Ok((origin, msg)) = fabric.recv().await {
                match session.upgrade() {
                    Some(inner) => inner.handle_message(origin, msg),
                    None => break,
                }
            }
            log::trace!("Stop receiving for {}", fabric.pid());
        });
    }

    /// Consumes the given `Session`, returning a thread-safe reference to it.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns the identifier of this session.
    pub fn id(&self) -> String {
        self.inner.pid.to_string()
    }

    /// Returns the clock stamping the replies of this session, if `add_timestamp` is set.
    pub fn hlc(&self) -> Option<&HLC> {
        self.inner.hlc.as_deref()
    }

    /// Returns the number of queryables currently declared in this session.
    pub fn queryables_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Close the zenoh [`Session`](Session).
    ///
    /// Every queryable of the session is undeclared and every pending query completes.
    /// Sessions are automatically closed when dropped, but you may want to use this function
    /// to handle errors or close the Session asynchronously.
    ///
    /// # Examples
    /// ```
    /// # async_std::task::block_on(async {
    /// use zenoh_queryable::prelude::*;
    ///
    /// let session = zenoh_queryable::open(config::peer()).res_async().await.unwrap();
    /// session.close().res_async().await.unwrap();
    /// # })
    /// ```
    pub fn close(self) -> SessionClose {
        SessionClose { session: self }
    }

    /// Create a [`Queryable`](crate::queryable::Queryable) for the given key expression.
    ///
    /// # Arguments
    ///
    /// * `key_expr` - The key expression matching the queries the
    /// [`Queryable`](crate::queryable::Queryable) will reply to
    ///
    /// # Examples
    /// ```
    /// # async_std::task::block_on(async {
    /// use zenoh_queryable::prelude::*;
    ///
    /// let session = zenoh_queryable::open(config::peer()).res_async().await.unwrap().into_arc();
    /// let queryable = session.declare_queryable("key/expression").res_async().await.unwrap();
    /// async_std::task::spawn(async move {
    ///     while let Ok(query) = queryable.recv_async().await {
    ///         query.reply_async(Sample::try_from(
    ///             "key/expression",
    ///             "value",
    ///         ).unwrap()).await.unwrap();
    ///     }
    /// });
    /// # })
    /// ```
    pub fn declare_queryable<TryIntoKeyExpr>(
        &self,
        key_expr: TryIntoKeyExpr,
    ) -> QueryableBuilder<'_, DefaultHandler>
    where
        TryIntoKeyExpr: TryInto<KeyExpr>,
        <TryIntoKeyExpr as TryInto<KeyExpr>>::Error: Into<ZError>,
    {
        QueryableBuilder {
            session: self,
            key_expr: key_expr.try_into().map_err(Into::into),
            complete: true,
            handler: DefaultHandler::new(*API_QUERY_RECEPTION_CHANNEL_SIZE),
        }
    }

    /// Query data from the matching queryables in the system.
    ///
    /// Unless explicitly requested via [`GetBuilder::consolidation`], no consolidation is
    /// applied on the replies.
    ///
    /// # Arguments
    ///
    /// * `selector` - The selection of resources to query
    ///
    /// # Examples
    /// ```
    /// use zenoh_queryable::prelude::*;
    ///
    /// let session = zenoh_queryable::open(config::peer()).res().unwrap();
    /// let replies = session.get("key/expression").res().unwrap();
    /// while let Ok(reply) = replies.recv() {
    ///     println!(">> Received {:?}", reply.sample);
    /// }
    /// ```
    pub fn get<IntoSelector>(&self, selector: IntoSelector) -> GetBuilder<'_, DefaultHandler>
    where
        IntoSelector: TryInto<Selector>,
        <IntoSelector as TryInto<Selector>>::Error: Into<ZError>,
    {
        GetBuilder {
            session: self,
            selector: selector.try_into().map_err(Into::into),
            target: QueryTarget::default(),
            consolidation: ConsolidationMode::default(),
            local_routing: None,
            timeout: self.inner.queries_default_timeout,
            handler: DefaultHandler::new(*API_REPLY_RECEPTION_CHANNEL_SIZE),
        }
    }

    /// Routes a query received from `origin` to the queryables of this session.
    ///
    /// `raw_selector` is split on its first `?`. Returns the number of queryables the query was
    /// dispatched to. The replies, then a final reply, are sent back to `origin`; this also
    /// holds when the key expression is invalid, in which case only the final reply is sent.
    pub fn deliver_query(
        &self,
        origin: PeerId,
        qid: ZInt,
        raw_selector: &str,
        target: QueryTarget,
    ) -> ZResult<usize> {
        let (raw_key_expr, value_selector) = split_selector(raw_selector);
        self.inner
            .handle_query(origin, raw_key_expr, value_selector, qid, target)
    }

    pub(crate) fn query(
        &self,
        selector: &Selector,
        target: QueryTarget,
        consolidation: ConsolidationMode,
        local_routing: Option<bool>,
        timeout: Duration,
        callback: Callback<Reply>,
    ) -> ZResult<()> {
        let inner = &self.inner;
        if !inner.alive.load(Ordering::SeqCst) {
            return zerror!(ZErrorKind::SessionClosed);
        }
        let local_routing = local_routing.unwrap_or(inner.local_routing);
        let qid = inner.qid_counter.fetch_add(1, Ordering::SeqCst);
        let peers = inner.fabric.peers();
        let nb_final = peers.len() + if local_routing { 1 } else { 0 };
        log::trace!(
            "get({}, {:?}, {:?}) qid: {}, {} final(s) expected",
            selector,
            target,
            consolidation,
            qid,
            nb_final
        );
        inner
            .queries
            .register(qid, nb_final, consolidation, callback);
        if nb_final == 0 {
            return Ok(());
        }

        let queries = Arc::downgrade(&inner.queries);
        let pid = inner.pid;
        task::spawn(async move {
            task::sleep(timeout).await;
            if let Some(queries) = queries.upgrade() {
                queries.timeout(qid, pid);
            }
        });

        for peer in peers {
            let fabric = inner.fabric.clone();
            let queries = inner.queries.clone();
            let msg = ZenohMessage::Query {
                key_expr: selector.key_expr.to_string(),
                value_selector: selector.value_selector().to_string(),
                qid,
                target,
                consolidation,
            };
            task::spawn(async move {
                if let Err(e) = fabric.send(&peer, msg).await {
                    log::error!("Failed to send query {} to {}: {}", qid, peer, e);
                    queries.reply_final(qid);
                }
            });
        }

        if local_routing {
            inner.route_query(
                pid,
                &selector.key_expr,
                selector.value_selector(),
                qid,
                target,
            );
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.inner.alive.load(Ordering::SeqCst) {
            task::block_on(self.inner.close());
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id()).finish()
    }
}

/// The closing of a [`Session`], resolved with [`SyncResolve`] or [`AsyncResolve`].
pub struct SessionClose {
    session: Session,
}

impl Resolvable for SessionClose {
    type Output = ZResult<()>;
}

impl SyncResolve for SessionClose {
    fn res_sync(self) -> Self::Output {
        task::block_on(self.res_async())
    }
}

impl AsyncResolve for SessionClose {
    type Future = BoxFuture<'static, Self::Output>;

    fn res_async(self) -> Self::Future {
        let session = self.session;
        Box::pin(async move {
            session.inner.close().await;
            Ok(())
        })
    }
}

/// A builder for opening a [`Session`].
pub struct OpenBuilder {
    pub(crate) config: Config,
    pub(crate) fabric: Option<Arc<dyn Fabric>>,
    pub(crate) hub: Option<LocalHub>,
}

impl OpenBuilder {
    /// Attach the session to the given [`LocalHub`], alongside every other session attached to it.
    #[inline]
    pub fn hub(mut self, hub: &LocalHub) -> Self {
        self.hub = Some(hub.clone());
        self
    }

    /// Attach the session to a custom [`Fabric`]. The id of the session is the fabric's one.
    #[inline]
    pub fn fabric(mut self, fabric: Arc<dyn Fabric>) -> Self {
        self.fabric = Some(fabric);
        self
    }
}

impl Resolvable for OpenBuilder {
    type Output = ZResult<Session>;
}

impl SyncResolve for OpenBuilder {
    fn res_sync(self) -> Self::Output {
        let fabric = match self.fabric {
            Some(fabric) => fabric,
            None => {
                let pid = match &self.config.id {
                    Some(id) => id.parse()?,
                    None => PeerId::rand(),
                };
                let hub = self.hub.unwrap_or_default();
                Arc::new(hub.join(pid)) as Arc<dyn Fabric>
            }
        };
        Ok(Session::new(self.config, fabric))
    }
}

impl AsyncResolve for OpenBuilder {
    type Future = futures::future::Ready<Self::Output>;

    fn res_async(self) -> Self::Future {
        futures::future::ready(self.res_sync())
    }
}
