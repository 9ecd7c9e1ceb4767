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
use super::{KeyExpr, DELIMITER, DOUBLE_WILD, STAR_DSL};

pub const DEFAULT_INCLUDER: LTRIncluder = LTRIncluder;

pub trait Includer<Left, Right> {
    /// Returns `true` if the set defined by `left` includes the one defined by `right`
    fn includes(&self, left: Left, right: Right) -> bool;
}

impl<T: for<'a> Includer<&'a [u8], &'a [u8]>> Includer<&KeyExpr, &KeyExpr> for T {
    fn includes(&self, left: &KeyExpr, right: &KeyExpr) -> bool {
        let left = left.as_str();
        let right = right.as_str();
        if left == right {
            return true;
        }
        if !left.contains('*') {
            return false;
        }
        self.includes(left.as_bytes(), right.as_bytes())
    }
}

#[inline(always)]
fn split_once(s: &[u8]) -> (&[u8], &[u8]) {
    match s.iter().position(|c| *c == DELIMITER as u8) {
        Some(i) => (&s[..i], &s[(i + 1)..]),
        None => (s, b""),
    }
}

pub struct LTRIncluder;

impl Includer<&[u8], &[u8]> for LTRIncluder {
    fn includes(&self, mut left: &[u8], mut right: &[u8]) -> bool {
        let double_wild = DOUBLE_WILD.as_bytes();
        loop {
            let (lchunk, lrest) = split_once(left);
            let lempty = lrest.is_empty();
            if lchunk == double_wild {
                if lempty || self.includes(lrest, right) {
                    return true;
                }
                right = split_once(right).1;
                if right.is_empty() {
                    return false;
                }
            } else {
                let (rchunk, rrest) = split_once(right);
                if !self.non_double_wild_chunk_includes(lchunk, rchunk) {
                    return false;
                }
                let rempty = rrest.is_empty();
                if lempty {
                    return rempty;
                }
                left = lrest;
                right = rrest;
            }
        }
    }
}

impl LTRIncluder {
    fn non_double_wild_chunk_includes(&self, lchunk: &[u8], rchunk: &[u8]) -> bool {
        if rchunk.is_empty() || rchunk == DOUBLE_WILD.as_bytes() {
            return false;
        }
        if lchunk == rchunk || lchunk == b"*" {
            return true;
        }
        if !lchunk.contains(&b'$') {
            return false;
        }
        star_dsl_includes(lchunk, rchunk)
    }
}

/// `left`'s `$*` may absorb any run of `right`'s bytes, `$*` included,
/// while a `$*` of `right` can only be absorbed by a `$*` of `left`.
fn star_dsl_includes(left: &[u8], right: &[u8]) -> bool {
    let star_dsl = STAR_DSL.as_bytes();
    if left.is_empty() {
        return right.is_empty();
    }
    if left.starts_with(star_dsl) {
        let rest = &left[star_dsl.len()..];
        return (0..=right.len())
            .filter(|&i| i == 0 || right[i - 1] != b'$')
            .any(|i| star_dsl_includes(rest, &right[i..]));
    }
    if right.starts_with(star_dsl) {
        return false;
    }
    match right.first() {
        Some(c) if *c == left[0] => star_dsl_includes(&left[1..], &right[1..]),
        _ => false,
    }
}
