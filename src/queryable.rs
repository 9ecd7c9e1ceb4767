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

//! Queryable primitives.
use crate::core::{AsyncResolve, Resolvable, SyncResolve, ZErrorKind, ZResult};
use crate::handlers::{locked, Callback, DefaultHandler, IntoCallbackReceiverPair};
use crate::key_expr::KeyExpr;
use crate::net::protocol::core::{Id, ZInt};
use crate::net::routing::registry::QueryableRegistry;
use crate::sample::Sample;
use crate::selector::Selector;
use crate::Session;
use async_std::sync::RwLock;
use async_std::task;
use flume::{Sender, TrySendError};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use uhlc::HLC;

/// Structs received by a [`Queryable`].
///
/// A `Query` is bound to one query and one queryable: its replies are forwarded to the
/// querier in the order they are sent. Dropping the `Query` tells the querier that this
/// queryable is done replying.
pub struct Query {
    /// The key expression of this Query.
    pub(crate) key_expr: KeyExpr,
    /// The value_selector of this Query.
    pub(crate) value_selector: String,
    pub(crate) qid: ZInt,
    pub(crate) queryable_id: Id,
    pub(crate) queryable_alive: Arc<RwLock<bool>>,
    /// The sender to use to send replies to this query.
    /// When this sender is dropped, the reply is finalized.
    pub(crate) replies_sender: Sender<Sample>,
    pub(crate) hlc: Option<Arc<HLC>>,
}

impl Query {
    /// The full [`Selector`] of this Query.
    #[inline(always)]
    pub fn selector(&self) -> Selector {
        Selector::new(self.key_expr.clone(), self.value_selector.as_str())
    }

    /// The key selector part of this Query.
    #[inline(always)]
    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    /// The value selector part of this Query, raw.
    #[inline(always)]
    pub fn value_selector(&self) -> &str {
        &self.value_selector
    }

    /// Decodes the value selector of this Query, failing on duplicate parameters.
    pub fn decode_value_selector(&self) -> ZResult<HashMap<String, String>> {
        crate::selector::decode_value_selector(&self.value_selector)
    }

    /// Sends a reply to this Query.
    ///
    /// Blocks while the reply channel is full. Fails with [`ZErrorKind::UndeclaredQueryable`]
    /// if the queryable this Query was dispatched to has been undeclared since.
    ///
    /// The liveness check and the enqueue happen under a read guard of the queryable's alive
    /// flag. Undeclaring the queryable takes the write guard: it waits for replies already
    /// being enqueued, and every reply started after it fails.
    pub fn reply(&self, sample: Sample) -> ZResult<()> {
        let alive = match self.queryable_alive.try_read() {
            Some(alive) => alive,
            None => task::block_on(self.queryable_alive.read()),
        };
        let sample = self.prepare(*alive, sample)?;
        self.replies_sender
            .send(sample)
            .map_err(|_| zerror2!(ZErrorKind::SessionClosed))
    }

    /// Sends a reply to this Query asynchronously.
    pub async fn reply_async(&self, sample: Sample) -> ZResult<()> {
        let alive = self.queryable_alive.read().await;
        let sample = self.prepare(*alive, sample)?;
        self.replies_sender
            .send_async(sample)
            .await
            .map_err(|_| zerror2!(ZErrorKind::SessionClosed))
    }

    /// Tries sending a reply to this Query, failing instead of blocking if the reply channel is full.
    ///
    /// A queryable being undeclared counts as undeclared.
    pub fn try_reply(&self, sample: Sample) -> ZResult<()> {
        let alive = self.queryable_alive.try_read();
        let sample = self.prepare(alive.as_deref().map_or(false, |a| *a), sample)?;
        match self.replies_sender.try_send(sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => zerror!(ZErrorKind::Other {
                descr: format!("Reply channel of query {} is full", self.qid),
            }),
            Err(TrySendError::Disconnected(_)) => zerror!(ZErrorKind::SessionClosed),
        }
    }

    fn prepare(&self, alive: bool, mut sample: Sample) -> ZResult<Sample> {
        if !alive {
            log::warn!(
                "Reply of undeclared queryable {} to query {} dropped",
                self.queryable_id,
                self.qid
            );
            return zerror!(ZErrorKind::UndeclaredQueryable {
                id: self.queryable_id
            });
        }
        if let Some(hlc) = &self.hlc {
            sample.ensure_timestamp(hlc);
        }
        Ok(sample)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Query{{ key_expr: '{}', value_selector: '{}' }}",
            self.key_expr, self.value_selector
        )
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Query{{ '{}' }}", self.selector())
    }
}

/// A registration of the Queryable Registry.
pub(crate) struct QueryableState {
    pub(crate) id: Id,
    pub(crate) key_expr: KeyExpr,
    pub(crate) complete: bool,
    /// Flips to `false` on undeclaration or session teardown, never back.
    pub(crate) alive: Arc<RwLock<bool>>,
    pub(crate) callback: Callback<Query>,
}

impl QueryableState {
    /// `false` once undeclared, or while being undeclared.
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.try_read().map_or(false, |alive| *alive)
    }

    /// Marks this registration dead, waiting for the replies being enqueued.
    pub(crate) fn kill(&self) {
        *task::block_on(self.alive.write()) = false;
    }
}

impl fmt::Debug for QueryableState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Queryable{{ id:{}, key_expr:{}, complete:{} }}",
            self.id, self.key_expr, self.complete
        )
    }
}

/// An entity able to reply to queries.
///
/// `Queryable`s are automatically undeclared when dropped. The handle only refers to its
/// registration by id: undeclaring it after its session was closed is a no-op.
pub struct Queryable<Receiver> {
    pub(crate) registry: Weak<QueryableRegistry>,
    pub(crate) id: Id,
    pub(crate) key_expr: KeyExpr,
    pub(crate) alive: bool,
    pub receiver: Receiver,
}

impl<Receiver> Queryable<Receiver> {
    /// The id of this queryable's registration.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn key_expr(&self) -> &KeyExpr {
        &self.key_expr
    }

    /// Undeclare a [`Queryable`] previously declared with [`declare_queryable`](Session::declare_queryable).
    ///
    /// Queryables are automatically undeclared when dropped, but you may want to use this function to handle errors or
    /// undeclare the Queryable asynchronously.
    ///
    /// # Examples
    /// ```
    /// use zenoh_queryable::prelude::*;
    ///
    /// let session = zenoh_queryable::open(config::peer()).res().unwrap();
    /// let queryable = session.declare_queryable("key/expression").res().unwrap();
    /// queryable.undeclare().res().unwrap();
    /// ```
    #[inline]
    pub fn undeclare(self) -> QueryableUndeclaration<Receiver> {
        QueryableUndeclaration { queryable: self }
    }

    fn undeclare_impl(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        match self.registry.upgrade() {
            Some(registry) => registry.undeclare(self.id),
            None => log::trace!("Undeclare queryable {} after session teardown", self.id),
        }
    }
}

impl<Receiver> Drop for Queryable<Receiver> {
    fn drop(&mut self) {
        self.undeclare_impl();
    }
}

impl<Receiver> Deref for Queryable<Receiver> {
    type Target = Receiver;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}

impl<Receiver> DerefMut for Queryable<Receiver> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.receiver
    }
}

impl<Receiver> fmt::Debug for Queryable<Receiver> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("id", &self.id)
            .field("key_expr", &self.key_expr)
            .finish()
    }
}

/// The undeclaration of a [`Queryable`], resolved with [`SyncResolve`] or [`AsyncResolve`].
pub struct QueryableUndeclaration<Receiver> {
    queryable: Queryable<Receiver>,
}

impl<Receiver> Resolvable for QueryableUndeclaration<Receiver> {
    type Output = ZResult<()>;
}

impl<Receiver: Send> SyncResolve for QueryableUndeclaration<Receiver> {
    fn res_sync(mut self) -> Self::Output {
        self.queryable.undeclare_impl();
        Ok(())
    }
}

impl<Receiver: Send> AsyncResolve for QueryableUndeclaration<Receiver> {
    type Future = futures::future::Ready<Self::Output>;

    fn res_async(self) -> Self::Future {
        futures::future::ready(self.res_sync())
    }
}

/// A builder for initializing a [`Queryable`].
///
/// # Examples
/// ```
/// use zenoh_queryable::prelude::*;
///
/// let session = zenoh_queryable::open(config::peer()).res().unwrap();
/// let queryable = session
///     .declare_queryable("key/expression")
///     .complete(true)
///     .res()
///     .unwrap();
/// ```
pub struct QueryableBuilder<'a, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) key_expr: ZResult<KeyExpr>,
    pub(crate) complete: bool,
    pub(crate) handler: Handler,
}

impl<'a> QueryableBuilder<'a, DefaultHandler> {
    /// Receive the queries for this Queryable with a callback.
    ///
    /// The callback is called on a thread that may block: a slow callback only delays the
    /// replies of its own queryable.
    #[inline]
    pub fn callback<Callback>(self, callback: Callback) -> QueryableBuilder<'a, Callback>
    where
        Callback: Fn(Query) + Send + Sync + 'static,
    {
        self.with(callback)
    }

    /// Receive the queries for this Queryable with a mutable callback.
    ///
    /// Using this guarantees that your callback will never be called concurrently.
    #[inline]
    pub fn callback_mut<CallbackMut>(
        self,
        callback: CallbackMut,
    ) -> QueryableBuilder<'a, impl Fn(Query) + Send + Sync + 'static>
    where
        CallbackMut: FnMut(Query) + Send + Sync + 'static,
    {
        self.callback(locked(callback))
    }

    /// Receive the queries for this Queryable with a [`Handler`](IntoCallbackReceiverPair).
    ///
    /// # Examples
    /// ```
    /// use zenoh_queryable::prelude::*;
    ///
    /// let session = zenoh_queryable::open(config::peer()).res().unwrap();
    /// let queryable = session
    ///     .declare_queryable("key/expression")
    ///     .with(flume::bounded(32))
    ///     .res()
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn with<Handler>(self, handler: Handler) -> QueryableBuilder<'a, Handler>
    where
        Handler: IntoCallbackReceiverPair<Query>,
    {
        let QueryableBuilder {
            session,
            key_expr,
            complete,
            handler: _,
        } = self;
        QueryableBuilder {
            session,
            key_expr,
            complete,
            handler,
        }
    }
}

impl<'a, Handler> QueryableBuilder<'a, Handler> {
    /// Change queryable completeness.
    ///
    /// A complete queryable can answer for every key its key expression matches.
    #[inline]
    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }
}

impl<Handler> Resolvable for QueryableBuilder<'_, Handler>
where
    Handler: IntoCallbackReceiverPair<Query>,
{
    type Output = ZResult<Queryable<Handler::Receiver>>;
}

impl<Handler> SyncResolve for QueryableBuilder<'_, Handler>
where
    Handler: IntoCallbackReceiverPair<Query> + Send,
    Handler::Receiver: Send,
{
    fn res_sync(self) -> Self::Output {
        let key_expr = self.key_expr?;
        log::trace!("declare_queryable({:?}, complete: {})", key_expr, self.complete);
        let (callback, receiver) = self.handler.into_cb_receiver_pair();
        let registry = &self.session.inner.registry;
        let state = registry.declare(key_expr, self.complete, callback)?;
        Ok(Queryable {
            registry: Arc::downgrade(registry),
            id: state.id,
            key_expr: state.key_expr.clone(),
            alive: true,
            receiver,
        })
    }
}

impl<Handler> AsyncResolve for QueryableBuilder<'_, Handler>
where
    Handler: IntoCallbackReceiverPair<Query> + Send,
    Handler::Receiver: Send,
{
    type Future = futures::future::Ready<Self::Output>;

    fn res_async(self) -> Self::Future {
        futures::future::ready(self.res_sync())
    }
}
