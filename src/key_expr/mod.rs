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

//! Key expressions: `/`-separated, wildcard-capable names of resources.
use crate::core::{ZErrorKind, ZResult};
use std::convert::TryFrom;
use std::fmt;
use std::ops::{Deref, Div};
use std::str::FromStr;
use std::sync::Arc;

pub(crate) const DELIMITER: char = '/';
pub(crate) const SINGLE_WILD: char = '*';
pub(crate) const DOUBLE_WILD: &str = "**";
pub(crate) const STAR_DSL: &str = "$*";
pub(crate) const FORBIDDEN_CHARS: [char; 3] = ['#', '?', '$'];

pub mod canon;
pub mod include;
pub mod intersect;

#[cfg(test)]
mod tests;

use canon::Canonizable;

/// A string that is statically known to be a valid key expression in canon form.
///
/// * Key expressions are `/`-separated lists of non-empty UTF-8 chunks.
/// * They may not start or end with `/`, nor contain `//` or any of `#?`. `$` is only
///   allowed as part of the sub-chunk wildcard `$*`.
/// * `*` matches exactly one chunk, `**` matches any number of chunks (zero included)
///   and `$*` matches any run of characters inside a chunk.
/// * Canon form (`**/**` is `**`, `**/*` is `*/**`, a lone `$*` is `*`) guarantees that two
///   key expressions defining the same set of keys are the same string.
///
/// Cloning a `KeyExpr` is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyExpr(Arc<str>);

/// The relation between two key expressions, from the left one's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetIntersectionLevel {
    Disjoint,
    Intersects,
    Includes,
    Equals,
}

fn invalid<T>(key_expr: &str, reason: &str) -> ZResult<T> {
    zerror!(ZErrorKind::InvalidKeyExpr {
        key_expr: key_expr.to_string(),
        reason: reason.to_string(),
    })
}

fn check(value: &str) -> ZResult<()> {
    if value.is_empty() {
        return invalid(value, "empty key expressions are forbidden");
    }
    let mut in_big_wild = false;
    for chunk in value.split(DELIMITER) {
        if chunk.is_empty() {
            return invalid(
                value,
                "empty chunks are forbidden, as well as leading and trailing slashes",
            );
        }
        if chunk == STAR_DSL {
            return invalid(value, "lone `$*`s must be replaced by `*` to reach canon-form");
        }
        if in_big_wild {
            match chunk {
                DOUBLE_WILD => {
                    return invalid(value, "`**/**` must be replaced by `**` to reach canon-form")
                }
                "*" => return invalid(value, "`**/*` must be replaced by `*/**` to reach canon-form"),
                _ => {}
            }
        }
        if chunk == DOUBLE_WILD {
            in_big_wild = true;
        } else {
            in_big_wild = false;
            if chunk != "*" {
                let mut split = chunk.split(SINGLE_WILD);
                split.next_back();
                if split.any(|s| !s.ends_with('$')) {
                    return invalid(value, "`*` and `**` may only be preceded and followed by `/`");
                }
            }
        }
    }

    let bytes = value.as_bytes();
    for (index, forbidden) in value
        .char_indices()
        .filter(|(_, c)| FORBIDDEN_CHARS.contains(c))
    {
        if forbidden == '$' {
            match bytes.get(index + 1) {
                Some(b'*') => {
                    if let Some(b'$') = bytes.get(index + 2) {
                        return invalid(value, "`$` is not allowed after `$*`");
                    }
                }
                _ => return invalid(value, "`$` is only allowed in `$*`"),
            }
        } else {
            return invalid(value, "`#` and `?` are forbidden characters");
        }
    }
    Ok(())
}

impl KeyExpr {
    /// Builds a `KeyExpr` from a string that must already be in canon form.
    ///
    /// Use [`KeyExpr::autocanonize`] if `value` may not be canon.
    pub fn new<S: AsRef<str>>(value: S) -> ZResult<KeyExpr> {
        let value = value.as_ref();
        check(value)?;
        Ok(KeyExpr(Arc::from(value)))
    }

    /// Canonizes `value` (dropping redundant `/`, collapsing redundant wildcards) before
    /// validating it.
    pub fn autocanonize<S: Into<String>>(value: S) -> ZResult<KeyExpr> {
        let raw: String = value.into();
        let mut canon = raw.clone();
        canon.canonize();
        match check(&canon) {
            Ok(()) => Ok(KeyExpr(Arc::from(canon))),
            Err(e) => {
                // Report the expression as the caller wrote it.
                let reason = match e.kind() {
                    ZErrorKind::InvalidKeyExpr { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                invalid(&raw, &reason)
            }
        }
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the `KeyExpr`s intersect, i.e. there exists at least one key which is
    /// contained in both of the sets defined by `self` and `other`.
    pub fn intersects(&self, other: &KeyExpr) -> bool {
        use intersect::Intersector;
        intersect::DEFAULT_INTERSECTOR.intersect(self, other)
    }

    /// Returns `true` if `self` includes `other`, i.e. the set defined by `self` contains every
    /// key belonging to the set defined by `other`.
    pub fn includes(&self, other: &KeyExpr) -> bool {
        use include::Includer;
        include::DEFAULT_INCLUDER.includes(self, other)
    }

    /// Returns the relation between `self` and `other` from `self`'s point of view.
    pub fn relation_to(&self, other: &KeyExpr) -> SetIntersectionLevel {
        use SetIntersectionLevel::*;
        if self.intersects(other) {
            if self == other {
                Equals
            } else if self.includes(other) {
                Includes
            } else {
                Intersects
            }
        } else {
            Disjoint
        }
    }

    /// Joins both sides, inserting a `/` in between them, and canonizes the result.
    pub fn join<S: AsRef<str> + ?Sized>(&self, other: &S) -> ZResult<KeyExpr> {
        KeyExpr::autocanonize(format!("{}/{}", self, other.as_ref()))
    }

    /// Returns `true` if `self` contains any wildcard (`*`, `**` or `$*`).
    pub fn is_wild(&self) -> bool {
        self.0.contains(SINGLE_WILD)
    }

    /// Returns the longest chunk-aligned prefix of `self` that contains no wildcard.
    pub fn get_nonwild_prefix(&self) -> Option<KeyExpr> {
        match self.0.find(SINGLE_WILD) {
            Some(i) => self.0[..i]
                .rfind(DELIMITER)
                .map(|j| KeyExpr(Arc::from(&self.0[..j]))),
            None => Some(self.clone()),
        }
    }
}

/// Parses and canonizes a raw key expression.
pub fn parse_key_expr(raw: &str) -> ZResult<KeyExpr> {
    KeyExpr::autocanonize(raw)
}

impl Deref for KeyExpr {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for KeyExpr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for KeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ke`{}`", self.0)
    }
}

impl TryFrom<&str> for KeyExpr {
    type Error = crate::core::ZError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        KeyExpr::autocanonize(value)
    }
}

impl TryFrom<String> for KeyExpr {
    type Error = crate::core::ZError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        KeyExpr::autocanonize(value)
    }
}

impl TryFrom<&String> for KeyExpr {
    type Error = crate::core::ZError;
    fn try_from(value: &String) -> Result<Self, Self::Error> {
        KeyExpr::autocanonize(value.as_str())
    }
}

impl From<&KeyExpr> for KeyExpr {
    fn from(value: &KeyExpr) -> Self {
        value.clone()
    }
}

impl FromStr for KeyExpr {
    type Err = crate::core::ZError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyExpr::autocanonize(s)
    }
}

impl Div<&KeyExpr> for &KeyExpr {
    type Output = KeyExpr;
    fn div(self, rhs: &KeyExpr) -> Self::Output {
        // Both sides are valid, the concatenation only needs canonization.
        let mut joined = format!("{}/{}", self, rhs);
        joined.canonize();
        KeyExpr(Arc::from(joined))
    }
}
