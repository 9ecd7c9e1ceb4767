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

//! A "prelude" for crates using the `zenoh_queryable` crate.
//!
//! ```
//! use zenoh_queryable::prelude::*;
//! ```
pub use crate::config::{self, Config};
pub use crate::core::{AsyncResolve, Resolvable, SyncResolve};
pub use crate::handlers::{CallbackDrop, IntoCallbackReceiverPair};
pub use crate::key_expr::KeyExpr;
pub use crate::net::fabric::{Fabric, LocalHub};
pub use crate::net::protocol::core::PeerId;
pub use crate::query::{ConsolidationMode, QueryTarget, Reply};
pub use crate::queryable::{Query, Queryable};
pub use crate::sample::{Encoding, Sample, SampleKind, Timestamp, Value};
pub use crate::selector::{Selector, ValueSelector};
pub use crate::Session;
