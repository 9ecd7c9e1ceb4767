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

//! Queryables, queries and their replies, over a network of zenoh peers.
//!
//! A [`Session`] declares [`Queryable`](queryable::Queryable)s on key expressions and issues
//! queries with [`Session::get`]. Every query is routed to the queryables, local or remote,
//! whose key expression intersects the queried one. Each of them may reply any number of
//! times before being done.
//!
//! # Examples
//!
//! ### Reply to queries
//! ```
//! use zenoh_queryable::prelude::*;
//!
//! let session = zenoh_queryable::open(config::peer()).res().unwrap();
//! let _queryable = session
//!     .declare_queryable("demo/example/**")
//!     .callback(|query| {
//!         let sample = Sample::try_from("demo/example/hello", "Hello World!").unwrap();
//!         query.reply(sample).unwrap();
//!     })
//!     .res()
//!     .unwrap();
//!
//! let replies = session.get("demo/example/hello?name=zenoh").res().unwrap();
//! while let Ok(reply) = replies.recv() {
//!     println!(">> {:?}", reply.sample);
//! }
//! ```
#![doc(
    html_logo_url = "http://zenoh.io/img/zenoh-dragon.png",
    html_favicon_url = "http://zenoh.io/favicon-32x32.png"
)]

#[macro_use]
pub mod core;

pub mod config;
pub mod handlers;
pub mod key_expr;
pub mod net;
pub mod prelude;
pub mod query;
pub mod queryable;
pub mod sample;
pub mod selector;
mod session;

pub use crate::core::{ZError, ZErrorKind, ZResult};
pub use config::Config;
pub use session::{OpenBuilder, Session, SessionClose};

zconfigurable! {
    /// The capacity of the default channel receiving the queries of a queryable.
    pub static ref API_QUERY_RECEPTION_CHANNEL_SIZE: usize = 256;
    /// The capacity of the channel carrying the replies of local queryables to one query.
    pub static ref API_REPLY_EMISSION_CHANNEL_SIZE: usize = 256;
    /// The capacity of the default channel receiving the replies of a query.
    pub static ref API_REPLY_RECEPTION_CHANNEL_SIZE: usize = 256;
    /// The capacity of the inbound channel of a [`LocalLink`](net::fabric::LocalLink).
    pub static ref FABRIC_CHANNEL_SIZE: usize = 256;
}

/// Initialize a Session.
///
/// Without an explicit [`hub`](OpenBuilder::hub) or [`fabric`](OpenBuilder::fabric), the
/// session is alone on its own fabric and only its local queryables answer its queries.
///
/// # Arguments
///
/// * `config` - The [`Config`] for the zenoh session
///
/// # Examples
/// ```
/// # async_std::task::block_on(async {
/// use zenoh_queryable::prelude::*;
///
/// let hub = LocalHub::new();
/// let session = zenoh_queryable::open(config::peer()).hub(&hub).res_async().await.unwrap();
/// # })
/// ```
pub fn open(config: Config) -> OpenBuilder {
    OpenBuilder {
        config,
        fabric: None,
        hub: None,
    }
}

/// Initializes the logger from the `RUST_LOG` environment variable.
///
/// Calling it more than once has no effect.
pub fn init_log() {
    let _ = env_logger::try_init();
}
