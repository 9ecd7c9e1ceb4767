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

//! Configuration to pass to [`open`](super::open) and associated helpers.
use crate::core::{ZErrorKind, ZResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Creates a default Session configuration (equivalent to `peer`).
pub fn default() -> Config {
    peer()
}

/// Creates a default `'peer'` Session configuration.
pub fn peer() -> Config {
    Config::default()
}

/// The configuration of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The id of the session's peer, a random one is generated if `None`.
    pub id: Option<String>,
    /// Whether the queries of a session are also routed to its own queryables.
    pub local_routing: bool,
    /// The default timeout of queries, in milliseconds.
    pub queries_default_timeout: u64,
    /// Whether the replies sent without a timestamp are stamped with the session's clock.
    pub add_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            id: None,
            local_routing: true,
            queries_default_timeout: 10_000,
            add_timestamp: true,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> ZResult<Config> {
        serde_json::from_str(json).map_err(|e| {
            zerror2!(
                ZErrorKind::Other {
                    descr: "Invalid configuration".to_string(),
                },
                e
            )
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ZResult<Config> {
        let path = path.as_ref();
        let mut content = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut content))
            .map_err(|e| {
                zerror2!(
                    ZErrorKind::IoError {
                        descr: format!("Failed to read {}", path.display()),
                    },
                    e
                )
            })?;
        log::debug!("Config loaded from {}", path.display());
        Config::from_json(&content)
    }

    pub fn queries_default_timeout(&self) -> Duration {
        Duration::from_millis(self.queries_default_timeout)
    }
}
