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
use super::{parse_key_expr, KeyExpr, SetIntersectionLevel};
use crate::core::ZErrorKind;

fn ke(s: &str) -> KeyExpr {
    KeyExpr::new(s).unwrap()
}

fn intersect(l: &str, r: &str) -> bool {
    let (left, right) = (ke(l), ke(r));
    let response = left.intersects(&right);
    assert_eq!(
        response,
        right.intersects(&left),
        "intersection between `{}` and `{}` is not symmetric",
        l,
        r
    );
    response
}

fn includes(l: &str, r: &str) -> bool {
    ke(l).includes(&ke(r))
}

#[test]
fn intersections() {
    assert!(intersect("a", "a"));
    assert!(intersect("a/b", "a/b"));
    assert!(intersect("*", "abc"));
    assert!(intersect("*", "xxx"));
    assert!(intersect("ab$*", "abcd"));
    assert!(intersect("ab$*d", "abcd"));
    assert!(intersect("ab$*", "ab"));
    assert!(!intersect("ab/*", "ab"));
    assert!(intersect("a/*/c/*/e", "a/b/c/d/e"));
    assert!(intersect("a/$*b/c/$*d/e", "a/xb/c/xd/e"));
    assert!(!intersect("a/*/c/*/e", "a/c/e"));
    assert!(!intersect("a/*/c/*/e", "a/b/c/d/x/e"));
    assert!(!intersect("ab$*cd", "abxxcxxd"));
    assert!(intersect("ab$*cd", "abxxcxxcd"));
    assert!(!intersect("ab$*cd", "abxxcxxcdx"));
    assert!(intersect("**", "abc"));
    assert!(intersect("**", "a/b/c"));
    assert!(intersect("ab/**", "ab"));
    assert!(intersect("**/xyz", "a/b/xyz/d/e/f/xyz"));
    assert!(!intersect("**/xyz$*xyz", "a/b/xyz/d/e/f/xyz"));
    assert!(intersect("**/xyz$*xyz", "a/b/xyzdefxyz"));
    assert!(intersect("a/**/c/**/e", "a/b/b/b/c/d/d/d/e"));
    assert!(intersect("a/**/c/**/e", "a/c/e"));
    assert!(intersect("a/**/c/*/e/*", "a/b/b/b/c/d/d/c/d/e/f"));
    assert!(!intersect("a/**/c/*/e/*", "a/b/b/b/c/d/d/c/d/d/e/f"));
    assert!(intersect("x/abc", "x/abc"));
    assert!(!intersect("x/abc", "abc"));
    assert!(intersect("x/*", "x/abc"));
    assert!(!intersect("x/*", "abc"));
    assert!(!intersect("*", "x/abc"));
    assert!(intersect("x/*", "x/abc$*"));
    assert!(intersect("x/$*abc", "x/abc$*"));
    assert!(intersect("x/a$*", "x/abc$*"));
    assert!(intersect("x/a$*de", "x/abc$*de"));
    assert!(intersect("x/a$*d$*e", "x/a$*e"));
    assert!(intersect("x/a$*d$*e", "x/a$*c$*e"));
    assert!(intersect("x/a$*d$*e", "x/ade"));
    assert!(!intersect("x/c$*", "x/abc$*"));
    assert!(!intersect("x/$*d", "x/$*e"));
}

#[test]
fn wildcards_on_both_sides() {
    assert!(intersect("a/*", "a/b"));
    assert!(!intersect("a/*", "a/b/c"));
    assert!(intersect("a/**", "a/b"));
    assert!(intersect("a/**", "a/b/c"));
    assert!(intersect("a/*/c", "a/**"));
    assert!(intersect("*/b", "a/*"));
    assert!(intersect("a/**/c", "**/b/c"));
    assert!(intersect("**", "**"));
    assert!(intersect("*/**", "a"));
    assert!(!intersect("*/*/**", "a"));
    assert!(!intersect("a/**", "b/**"));
}

#[test]
fn inclusions() {
    assert!(includes("**", "a/b/c"));
    assert!(includes("a/*", "a/b"));
    assert!(!includes("a/*", "a/b/c"));
    assert!(includes("a/**", "a/b/**"));
    assert!(!includes("a/b/**", "a/**"));
    assert!(includes("a/*/**", "a/b/**"));
    assert!(includes("**/c", "a/b/c"));
    assert!(includes("a/b$*", "a/bcd"));
    assert!(!includes("a/b$*", "a/c"));
    assert!(includes("a/b$*", "a/bc$*"));
    assert!(!includes("a/bc$*", "a/b$*"));
    assert!(!includes("a/*", "a/**"));
    assert!(includes("a/**", "a"));
}

#[test]
fn relations() {
    assert_eq!(ke("a/b").relation_to(&ke("a/b")), SetIntersectionLevel::Equals);
    assert_eq!(ke("a/**").relation_to(&ke("a/b")), SetIntersectionLevel::Includes);
    assert_eq!(ke("a/*/c").relation_to(&ke("a/b/*")), SetIntersectionLevel::Intersects);
    assert_eq!(ke("a/b").relation_to(&ke("c/d")), SetIntersectionLevel::Disjoint);
}

#[test]
fn strict_construction() {
    for invalid in [
        "", "/a", "a/", "a//b", "a/b?c", "a#b", "a/$b", "a/$*", "a/b*", "a/**/**", "a/**/*",
        "a/$*$b",
    ] {
        match KeyExpr::new(invalid) {
            Err(e) => assert!(
                matches!(e.kind(), ZErrorKind::InvalidKeyExpr { .. }),
                "unexpected error kind for `{}`: {}",
                invalid,
                e
            ),
            Ok(k) => panic!("`{}` was accepted as {:?}", invalid, k),
        }
    }
    for valid in ["a", "a/b/c", "*", "**", "a/*/**", "a/b$*", "$*a", "demo/example/**"] {
        assert!(KeyExpr::new(valid).is_ok(), "`{}` was rejected", valid);
    }
}

#[test]
fn autocanonization() {
    assert_eq!(parse_key_expr("/a//b/").unwrap().as_str(), "a/b");
    assert_eq!(parse_key_expr("a/**/**").unwrap().as_str(), "a/**");
    assert_eq!(parse_key_expr("a/**/*").unwrap().as_str(), "a/*/**");
    assert_eq!(parse_key_expr("a/$*").unwrap().as_str(), "a/*");
    assert!(parse_key_expr("/").is_err());
    assert!(parse_key_expr("a/b?c").is_err());
    let e = parse_key_expr("a/b*").unwrap_err();
    assert_eq!(
        e.kind(),
        &ZErrorKind::InvalidKeyExpr {
            key_expr: "a/b*".to_string(),
            reason: "`*` and `**` may only be preceded and followed by `/`".to_string(),
        }
    );
}

#[test]
fn parse_serialize_parse_is_stable() {
    for raw in [
        "a/b/c",
        "/a//b",
        "a/**/**/b",
        "**/*",
        "x/a$*$*d",
        "demo/**/test/*",
        "*/**/*",
    ] {
        let first = parse_key_expr(raw).unwrap();
        let second = parse_key_expr(&first.to_string()).unwrap();
        assert_eq!(first, second);
        assert_eq!(KeyExpr::new(first.as_str()).unwrap(), first);
    }
}

#[test]
fn joins_and_prefixes() {
    let workspace = ke("demo/example");
    assert_eq!(workspace.join("test/**").unwrap().as_str(), "demo/example/test/**");
    assert_eq!((&ke("a/**") / &ke("**")).as_str(), "a/**");
    assert!(workspace.join("a?b").is_err());
    assert_eq!(ke("demo/example/**").get_nonwild_prefix(), Some(ke("demo/example")));
    assert_eq!(ke("demo/**/test/**").get_nonwild_prefix(), Some(ke("demo")));
    assert_eq!(ke("demo/ex$*/**").get_nonwild_prefix(), Some(ke("demo")));
    assert_eq!(ke("**").get_nonwild_prefix(), None);
    assert!(ke("a/*").is_wild());
    assert!(!ke("a/b").is_wild());
}
