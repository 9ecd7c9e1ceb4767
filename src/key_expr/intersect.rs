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
use super::{KeyExpr, DELIMITER, DOUBLE_WILD, SINGLE_WILD};

pub const DEFAULT_INTERSECTOR: ClassicIntersector = ClassicIntersector;

/// The trait used to implement key expression intersectors.
pub trait Intersector<Left, Right> {
    fn intersect(&self, left: Left, right: Right) -> bool;
}

#[cold]
fn star_dsl_intersect(mut it1: &[u8], mut it2: &[u8]) -> bool {
    fn next(s: &[u8]) -> (u8, &[u8]) {
        (s[0], &s[1..])
    }
    while !it1.is_empty() && !it2.is_empty() {
        let (current1, advanced1) = next(it1);
        let (current2, advanced2) = next(it2);
        match (current1, current2) {
            (b'$', b'$') => {
                if advanced1.len() == 1 || advanced2.len() == 1 {
                    return true;
                }
                if star_dsl_intersect(&advanced1[1..], it2) {
                    return true;
                } else {
                    return star_dsl_intersect(it1, &advanced2[1..]);
                };
            }
            (b'$', _) => {
                if advanced1.len() == 1 {
                    return true;
                }
                if star_dsl_intersect(&advanced1[1..], it2) {
                    return true;
                }
                it2 = advanced2;
            }
            (_, b'$') => {
                if advanced2.len() == 1 {
                    return true;
                }
                if star_dsl_intersect(it1, &advanced2[1..]) {
                    return true;
                }
                it1 = advanced1;
            }
            (sub1, sub2) if sub1 == sub2 => {
                it1 = advanced1;
                it2 = advanced2;
            }
            (_, _) => return false,
        }
    }
    it1.is_empty() && it2.is_empty() || it1 == b"$*" || it2 == b"$*"
}

#[inline(always)]
fn chunk_intersect(c1: &[u8], c2: &[u8]) -> bool {
    c1 == c2 || c1 == b"*" || c2 == b"*" || star_dsl_intersect(c1, c2)
}

#[inline(always)]
fn next(s: &[u8]) -> (&[u8], &[u8]) {
    match s.iter().position(|c| *c == DELIMITER as u8) {
        Some(i) => (&s[..i], &s[(i + 1)..]),
        None => (s, b""),
    }
}

fn it_intersect(mut it1: &[u8], mut it2: &[u8]) -> bool {
    let double_wild = DOUBLE_WILD.as_bytes();
    while !it1.is_empty() && !it2.is_empty() {
        let (current1, advanced1) = next(it1);
        let (current2, advanced2) = next(it2);
        match (current1, current2) {
            (c, _) if c == double_wild => {
                if advanced1.is_empty() {
                    return true;
                }
                return it_intersect(it1, advanced2) || it_intersect(advanced1, it2);
            }
            (_, c) if c == double_wild => {
                if advanced2.is_empty() {
                    return true;
                }
                return it_intersect(advanced1, it2) || it_intersect(it1, advanced2);
            }
            (sub1, sub2) if chunk_intersect(sub1, sub2) => {
                it1 = advanced1;
                it2 = advanced2;
            }
            (_, _) => return false,
        }
    }
    (it1.is_empty() || it1 == double_wild) && (it2.is_empty() || it2 == double_wild)
}

/// Returns `true` if the given key expressions intersect.
///
/// I.e. if it exists a resource key (with no wildcards) that matches
/// both given key expressions.
#[inline(always)]
pub fn intersect(s1: &[u8], s2: &[u8]) -> bool {
    it_intersect(s1, s2)
}

pub struct ClassicIntersector;

impl Intersector<&[u8], &[u8]> for ClassicIntersector {
    fn intersect(&self, left: &[u8], right: &[u8]) -> bool {
        intersect(left, right)
    }
}

impl Intersector<&KeyExpr, &KeyExpr> for ClassicIntersector {
    fn intersect(&self, left: &KeyExpr, right: &KeyExpr) -> bool {
        let left = left.as_str();
        let right = right.as_str();
        if left == right {
            return true;
        }
        if !left.contains(SINGLE_WILD) && !right.contains(SINGLE_WILD) {
            return false;
        }
        self.intersect(left.as_bytes(), right.as_bytes())
    }
}
