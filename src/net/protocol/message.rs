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
use super::core::{ConsolidationMode, PeerId, QueryTarget, ZInt};
use crate::sample::Sample;

/// The messages exchanged by peers about queries.
///
/// The key expression of a query travels as a raw string: the receiving peer parses it
/// and rejects it if it is malformed.
#[derive(Debug, Clone)]
pub enum ZenohMessage {
    Query {
        key_expr: String,
        value_selector: String,
        qid: ZInt,
        target: QueryTarget,
        consolidation: ConsolidationMode,
    },
    ReplyData {
        qid: ZInt,
        replier_id: PeerId,
        sample: Sample,
    },
    ReplyFinal {
        qid: ZInt,
    },
}
