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

//! Query primitives.
use crate::core::{AsyncResolve, Resolvable, SyncResolve, ZErrorKind, ZResult};
use crate::handlers::{locked, DefaultHandler, IntoCallbackReceiverPair};
use crate::net::protocol::core::PeerId;
use crate::sample::Sample;
use crate::selector::Selector;
use crate::Session;
use std::time::Duration;

/// The [`Queryable`](crate::queryable::Queryable)s that should be target of a [`get`](Session::get).
pub use crate::net::protocol::core::QueryTarget;

/// The kind of consolidation applied on the replies of a [`get`](Session::get).
pub use crate::net::protocol::core::ConsolidationMode;

/// Structs returned by a [`get`](Session::get).
#[derive(Clone, Debug)]
pub struct Reply {
    /// The result of this Reply: a sample, or the error that closed the query.
    pub sample: Result<Sample, ZErrorKind>,
    /// The id of the zenoh instance that answered this Reply.
    pub replier_id: PeerId,
}

/// A builder for initializing a `query`.
///
/// # Examples
/// ```
/// # async_std::task::block_on(async {
/// use zenoh_queryable::prelude::*;
///
/// let session = zenoh_queryable::open(config::peer()).res_async().await.unwrap();
/// let replies = session
///     .get("key/expression?value>1")
///     .target(QueryTarget::All)
///     .consolidation(ConsolidationMode::None)
///     .res_async()
///     .await
///     .unwrap();
/// while let Ok(reply) = replies.recv_async().await {
///     println!("Received {:?}", reply.sample)
/// }
/// # })
/// ```
#[derive(Debug)]
pub struct GetBuilder<'a, Handler> {
    pub(crate) session: &'a Session,
    pub(crate) selector: ZResult<Selector>,
    pub(crate) target: QueryTarget,
    pub(crate) consolidation: ConsolidationMode,
    pub(crate) local_routing: Option<bool>,
    pub(crate) timeout: Duration,
    pub(crate) handler: Handler,
}

impl<'a> GetBuilder<'a, DefaultHandler> {
    /// Receive the replies for this query with a callback.
    ///
    /// # Examples
    /// ```
    /// use zenoh_queryable::prelude::*;
    ///
    /// let session = zenoh_queryable::open(config::peer()).res().unwrap();
    /// session
    ///     .get("key/expression")
    ///     .callback(|reply| {println!("Received {:?}", reply.sample);})
    ///     .res()
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn callback<Callback>(self, callback: Callback) -> GetBuilder<'a, Callback>
    where
        Callback: Fn(Reply) + Send + Sync + 'static,
    {
        self.with(callback)
    }

    /// Receive the replies for this query with a mutable callback.
    ///
    /// Using this guarantees that your callback will never be called concurrently.
    #[inline]
    pub fn callback_mut<CallbackMut>(
        self,
        callback: CallbackMut,
    ) -> GetBuilder<'a, impl Fn(Reply) + Send + Sync + 'static>
    where
        CallbackMut: FnMut(Reply) + Send + Sync + 'static,
    {
        self.callback(locked(callback))
    }

    /// Receive the replies for this query with a [`Handler`](IntoCallbackReceiverPair).
    ///
    /// The receiver is disconnected once the query completes or times out.
    #[inline]
    pub fn with<Handler>(self, handler: Handler) -> GetBuilder<'a, Handler>
    where
        Handler: IntoCallbackReceiverPair<Reply>,
    {
        let GetBuilder {
            session,
            selector,
            target,
            consolidation,
            local_routing,
            timeout,
            handler: _,
        } = self;
        GetBuilder {
            session,
            selector,
            target,
            consolidation,
            local_routing,
            timeout,
            handler,
        }
    }
}

impl<'a, Handler> GetBuilder<'a, Handler> {
    /// Change the target of the query.
    #[inline]
    pub fn target(mut self, target: QueryTarget) -> Self {
        self.target = target;
        self
    }

    /// Change the consolidation mode of the query.
    #[inline]
    pub fn consolidation(mut self, consolidation: ConsolidationMode) -> Self {
        self.consolidation = consolidation;
        self
    }

    /// Enable or disable local routing.
    #[inline]
    pub fn local_routing(mut self, local_routing: bool) -> Self {
        self.local_routing = Some(local_routing);
        self
    }

    /// Set query timeout.
    #[inline]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<Handler> Resolvable for GetBuilder<'_, Handler>
where
    Handler: IntoCallbackReceiverPair<Reply>,
{
    type Output = ZResult<Handler::Receiver>;
}

impl<Handler> SyncResolve for GetBuilder<'_, Handler>
where
    Handler: IntoCallbackReceiverPair<Reply> + Send,
    Handler::Receiver: Send,
{
    fn res_sync(self) -> Self::Output {
        let selector = self.selector?;
        let (callback, receiver) = self.handler.into_cb_receiver_pair();
        self.session
            .query(
                &selector,
                self.target,
                self.consolidation,
                self.local_routing,
                self.timeout,
                callback,
            )
            .map(|_| receiver)
    }
}

impl<Handler> AsyncResolve for GetBuilder<'_, Handler>
where
    Handler: IntoCallbackReceiverPair<Reply> + Send,
    Handler::Receiver: Send,
{
    type Future = futures::future::Ready<Self::Output>;

    fn res_async(self) -> Self::Future {
        futures::future::ready(self.res_sync())
    }
}
