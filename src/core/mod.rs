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

//! Errors, locking macros and the builder resolution traits.
#[macro_use]
pub mod macros;

pub mod zresult;
pub use zresult::{BoxedStdErr, ZError, ZErrorKind, ZResult};

/// Trait for resolving builder patterns with a synchronous operation.
///
/// Many builder patterns of this crate can be resolved with either [`SyncResolve`] or [`AsyncResolve`],
/// we advise sticking to either one or the other, rather than mixing them up.
pub trait SyncResolve: Sized + Resolvable + AsyncResolve {
    fn res_sync(self) -> Self::Output;
    /// Resolves the builder pattern synchronously
    ///
    /// This method is just a convenience alias to [`SyncResolve::res_sync`]
    fn res(self) -> Self::Output {
        self.res_sync()
    }
}

/// Trait for resolving builder patterns with an asynchronous operation.
pub trait AsyncResolve: Sized + Resolvable {
    /// This type is only exposed because trait functions can't return `impl Future<Self::Output> + Send`, do not rely on it being stable
    type Future: std::future::Future<Output = Self::Output> + Send;
    fn res_async(self) -> Self::Future;
}

/// Any builder pattern is implemented as a [`Resolvable`] data structure.
/// Resolving into [`Resolvable::Output`] can be done synchronously through [`SyncResolve::res_sync`],
/// or asynchronously through [`AsyncResolve::res_async`].
#[must_use = "Resolvables do nothing unless you resolve them using `res_sync` or `res_async`"]
pub trait Resolvable {
    type Output;
}
