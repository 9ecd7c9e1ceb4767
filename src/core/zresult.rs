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
use std::fmt;

pub type BoxedStdErr = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type ZResult<T> = Result<T, ZError>;

/// The kinds of errors raised by queryables, queries and their routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZErrorKind {
    /// A key expression failed to parse. Never partially accepted.
    InvalidKeyExpr { key_expr: String, reason: String },
    /// The same parameter appeared twice in a value selector.
    DuplicateParameter { key: String, value_selector: String },
    /// A value selector segment could not be read as a `key=value` pair.
    MalformedPair { pair: String },
    /// A reply was attempted through a queryable that was undeclared.
    UndeclaredQueryable { id: usize },
    /// A query closed before all of its targets had finished replying.
    Timeout { qid: u64 },
    /// The session was closed.
    SessionClosed,
    IoError { descr: String },
    Other { descr: String },
}

impl fmt::Display for ZErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZErrorKind::InvalidKeyExpr { key_expr, reason } => {
                write!(f, "Invalid key expression '{}': {}", key_expr, reason)
            }
            ZErrorKind::DuplicateParameter {
                key,
                value_selector,
            } => write!(
                f,
                "Detected duplicate key '{}' in value selector '{}'",
                key, value_selector
            ),
            ZErrorKind::MalformedPair { pair } => {
                write!(f, "Malformed key/value pair '{}' in value selector", pair)
            }
            ZErrorKind::UndeclaredQueryable { id } => {
                write!(f, "Queryable {} has been undeclared", id)
            }
            ZErrorKind::Timeout { qid } => write!(f, "Timeout on query {}", qid),
            ZErrorKind::SessionClosed => write!(f, "Session closed"),
            ZErrorKind::IoError { descr } => write!(f, "IO error ({})", descr),
            ZErrorKind::Other { descr } => write!(f, "{}", descr),
        }
    }
}

#[derive(Debug)]
pub struct ZError {
    kind: ZErrorKind,
    file: &'static str,
    line: u32,
    source: Option<BoxedStdErr>,
}

impl ZError {
    pub fn new(
        kind: ZErrorKind,
        file: &'static str,
        line: u32,
        source: Option<BoxedStdErr>,
    ) -> ZError {
        ZError {
            kind,
            file,
            line,
            source,
        }
    }

    pub fn kind(&self) -> &ZErrorKind {
        &self.kind
    }

    pub fn set_source<S: Into<BoxedStdErr>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl std::error::Error for ZError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(s) => Some(s.as_ref()),
            None => None,
        }
    }
}

impl From<std::convert::Infallible> for ZError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

impl fmt::Display for ZError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}.", self.kind, self.file, self.line)?;
        if let Some(s) = &self.source {
            write!(f, " - Caused by {}", *s)?;
        }
        Ok(())
    }
}
