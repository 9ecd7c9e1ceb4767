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
use crate::core::{ZErrorKind, ZResult};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type ZInt = u64;

/// The identifier of a declared entity (queryable) inside a session.
pub type Id = usize;

/// The global unique id of a zenoh peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(Uuid);

impl PeerId {
    /// Generates a new random `PeerId`.
    pub fn rand() -> PeerId {
        PeerId(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:X}", self.0.to_simple())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for PeerId {
    type Err = crate::core::ZError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(PeerId).map_err(|e| {
            zerror2!(
                ZErrorKind::Other {
                    descr: format!("Invalid id: {}", s),
                },
                e
            )
        })
    }
}

impl TryFrom<&str> for PeerId {
    type Error = crate::core::ZError;

    fn try_from(s: &str) -> ZResult<Self> {
        s.parse()
    }
}

/// The [`Queryable`](crate::queryable::Queryable)s that should be target of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    /// One complete queryable including the queried key expression if there is one, every
    /// matching queryable otherwise.
    BestMatching,
    /// Every queryable matching the queried key expression.
    All,
    /// Every complete queryable including the queried key expression.
    AllComplete,
}

impl Default for QueryTarget {
    fn default() -> Self {
        QueryTarget::All
    }
}

/// The kind of consolidation applied on the replies of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationMode {
    /// Every reply is delivered as soon as it is received.
    None,
    /// Only the most recent reply (by timestamp) for each key is delivered, once the query
    /// completes.
    Latest,
}

impl Default for ConsolidationMode {
    fn default() -> Self {
        ConsolidationMode::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_display_and_parse() {
        let pid = PeerId::rand();
        let s = pid.to_string();
        assert_eq!(s.len(), 32);
        assert_eq!(s, s.to_uppercase());
        assert_eq!(s.parse::<PeerId>().unwrap(), pid);
        assert!("not-an-id".parse::<PeerId>().is_err());
    }
}
