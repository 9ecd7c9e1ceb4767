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

//! Callback handler trait.
use std::sync::Arc;

/// An immutable callback function.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A function that can transform a [`FnMut`]`(T)` to
/// a [`Fn`]`(T)` with the help of a [`Mutex`](std::sync::Mutex).
pub fn locked<T>(fnmut: impl FnMut(T)) -> impl Fn(T) {
    let lock = std::sync::Mutex::new(fnmut);
    move |x| zlock!(lock)(x)
}

/// A type that can be converted into a [`Callback`]-receiver pair.
///
/// When the functions of this crate accept types that implement this, they use the [`Callback`]
/// as such, while granting you access to the receiver through the returned value.
///
/// Any closure that accepts `T` can be converted into a pair of itself and `()`.
pub trait IntoCallbackReceiverPair<T> {
    type Receiver;
    fn into_cb_receiver_pair(self) -> (Callback<T>, Self::Receiver);
}

impl<T, F> IntoCallbackReceiverPair<T> for F
where
    F: Fn(T) + Send + Sync + 'static,
{
    type Receiver = ();
    fn into_cb_receiver_pair(self) -> (Callback<T>, Self::Receiver) {
        (Arc::new(self), ())
    }
}

impl<T: Send + 'static> IntoCallbackReceiverPair<T>
    for (flume::Sender<T>, flume::Receiver<T>)
{
    type Receiver = flume::Receiver<T>;

    fn into_cb_receiver_pair(self) -> (Callback<T>, Self::Receiver) {
        let (sender, receiver) = self;
        (
            Arc::new(move |t| {
                if let Err(e) = sender.send(t) {
                    log::error!("{}", e)
                }
            }),
            receiver,
        )
    }
}

/// The default handler: a bounded [`flume`] channel.
///
/// The sending half is dropped with the entity the handler is attached to, so that the
/// receiver observes a disconnection once that entity is done.
#[derive(Debug, Clone, Copy)]
pub struct DefaultHandler {
    capacity: usize,
}

impl DefaultHandler {
    pub fn new(capacity: usize) -> Self {
        DefaultHandler { capacity }
    }
}

impl<T: Send + 'static> IntoCallbackReceiverPair<T> for DefaultHandler {
    type Receiver = flume::Receiver<T>;

    fn into_cb_receiver_pair(self) -> (Callback<T>, Self::Receiver) {
        flume::bounded(self.capacity).into_cb_receiver_pair()
    }
}

/// A handler containing 2 callback functions:
///  - `callback`: the typical callback function.
///  - `drop`: a callback called when this handler is dropped.
///
/// It is guaranteed that:
///
///   - `callback` will never be called once `drop` has started.
///   - `drop` will only be called **once**, and **after every** `callback` has ended.
///   - The two previous guarantees imply that `call` and `drop` are never called concurrently.
pub struct CallbackDrop<Callback, DropFn>
where
    DropFn: FnMut() + Send + Sync + 'static,
{
    pub callback: Callback,
    pub drop: DropFn,
}

impl<Callback, DropFn> Drop for CallbackDrop<Callback, DropFn>
where
    DropFn: FnMut() + Send + Sync + 'static,
{
    fn drop(&mut self) {
        (self.drop)()
    }
}

impl<OnEvent, Event, DropFn> IntoCallbackReceiverPair<Event> for CallbackDrop<OnEvent, DropFn>
where
    OnEvent: Fn(Event) + Send + Sync + 'static,
    DropFn: FnMut() + Send + Sync + 'static,
{
    type Receiver = ();

    fn into_cb_receiver_pair(self) -> (Callback<Event>, Self::Receiver) {
        (Arc::new(move |evt| (self.callback)(evt)), ())
    }
}
