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

//! Selectors and value selector decoding.
use crate::core::{ZErrorKind, ZResult};
use crate::key_expr::{parse_key_expr, KeyExpr};
use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// A selector is the combination of a [Key Expression](crate::key_expr::KeyExpr), which defines the
/// set of keys that are relevant to an operation, and a `value_selector`, a set of key-value pairs
/// used to pass arguments to queryables.
///
/// When in string form, selectors look a lot like a URI, with similar semantics:
/// - the `key_expr` before the first `?` must be a valid key expression.
/// - the `value_selector` after the first `?` should be encoded like the query section of a URL:
///     - key-value pairs are separated by `&`,
///     - the key and value are separated by the first `=`,
///     - in the absence of `=`, the value is considered to be the empty string,
///     - both key and value should use percent-encoding to escape characters,
///     - defining a value for the same key twice is an error.
///
/// The value selector is stored as is: it is only read when [`Selector::decode_value_selector`]
/// is called.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    /// The part of this selector identifying which keys should be part of the selection.
    pub key_expr: KeyExpr,
    /// The part of this selector carrying the query parameters, raw.
    pub(crate) value_selector: String,
}

impl Selector {
    pub fn new<S: Into<String>>(key_expr: KeyExpr, value_selector: S) -> Self {
        Selector {
            key_expr,
            value_selector: value_selector.into(),
        }
    }

    /// Returns this selectors components as a tuple.
    pub fn split(self) -> (KeyExpr, String) {
        (self.key_expr, self.value_selector)
    }

    /// Sets the `value_selector` part of this `Selector`.
    #[inline(always)]
    pub fn with_value_selector(mut self, value_selector: &str) -> Self {
        self.value_selector = value_selector.to_string();
        self
    }

    /// Gets the value selector as a raw string.
    pub fn value_selector(&self) -> &str {
        &self.value_selector
    }

    /// Appends percent-encoded `key=value` pairs to the value selector.
    pub fn extend<'b, I, K, V>(&'b mut self, key_value_pairs: I)
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str> + 'b,
        V: AsRef<str> + 'b,
    {
        let mut encoder = form_urlencoded::Serializer::new(&mut self.value_selector);
        encoder.extend_pairs(key_value_pairs).finish();
    }

    /// Decodes the value selector, see [`decode_value_selector`].
    pub fn decode_value_selector(&self) -> ZResult<HashMap<String, String>> {
        decode_value_selector(&self.value_selector)
    }
}

/// Splits `raw` on its first `?` into its key expression and value selector parts.
///
/// The value selector part is empty when `raw` has no `?`.
pub(crate) fn split_selector(raw: &str) -> (&str, &str) {
    match raw.find('?') {
        Some(qmark_position) => (&raw[..qmark_position], &raw[qmark_position + 1..]),
        None => (raw, ""),
    }
}

/// Parses `raw` as `key_expr[?value_selector]`, splitting on the first `?`.
///
/// The key expression part is canonized. The value selector part is kept verbatim.
pub fn parse_selector(raw: &str) -> ZResult<Selector> {
    let (raw_key_expr, value_selector) = split_selector(raw);
    Ok(Selector {
        key_expr: parse_key_expr(raw_key_expr)?,
        value_selector: value_selector.to_string(),
    })
}

/// A trait to help decode value selectors as properties.
pub trait ValueSelector<'a> {
    type Decoder: Iterator<Item = (Cow<'a, str>, Cow<'a, str>)> + Clone + 'a;

    /// Returns this value selector as an iterator over its percent-decoded pairs.
    fn decode(&'a self) -> Self::Decoder;
}

impl<'a> ValueSelector<'a> for Selector {
    type Decoder = <str as ValueSelector<'a>>::Decoder;
    fn decode(&'a self) -> Self::Decoder {
        self.value_selector().decode()
    }
}

impl<'a> ValueSelector<'a> for str {
    type Decoder = form_urlencoded::Parse<'a>;
    fn decode(&'a self) -> Self::Decoder {
        form_urlencoded::parse(self.as_bytes())
    }
}

/// Decodes a raw value selector into a map of its parameters.
///
/// Pairs are read from left to right. A pair without `=` maps to the empty string and empty
/// segments (`a=1&&b=2`) are skipped. The first key met twice fails the whole decoding with
/// [`ZErrorKind::DuplicateParameter`]: no value is ever overwritten or merged. A pair with an
/// empty key fails with [`ZErrorKind::MalformedPair`].
pub fn decode_value_selector(raw: &str) -> ZResult<HashMap<String, String>> {
    let mut parameters = HashMap::new();
    for (key, value) in raw.decode() {
        if key.is_empty() {
            return zerror!(ZErrorKind::MalformedPair {
                pair: format!("{}={}", key, value),
            });
        }
        if parameters.contains_key(&*key) {
            return zerror!(ZErrorKind::DuplicateParameter {
                key: key.into_owned(),
                value_selector: raw.to_string(),
            });
        }
        parameters.insert(key.into_owned(), value.into_owned());
    }
    Ok(parameters)
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sel\"{}\"", self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.value_selector.is_empty() {
            write!(f, "{}", self.key_expr)
        } else {
            write!(f, "{}?{}", self.key_expr, self.value_selector)
        }
    }
}

impl From<&Selector> for Selector {
    fn from(s: &Selector) -> Self {
        s.clone()
    }
}

impl From<KeyExpr> for Selector {
    fn from(key_expr: KeyExpr) -> Self {
        Selector::new(key_expr, "")
    }
}

impl From<&KeyExpr> for Selector {
    fn from(key_expr: &KeyExpr) -> Self {
        Selector::new(key_expr.clone(), "")
    }
}

impl TryFrom<&str> for Selector {
    type Error = crate::core::ZError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        parse_selector(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = crate::core::ZError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_selector(&s)
    }
}

impl TryFrom<&String> for Selector {
    type Error = crate::core::ZError;
    fn try_from(s: &String) -> Result<Self, Self::Error> {
        parse_selector(s)
    }
}

impl FromStr for Selector {
    type Err = crate::core::ZError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_selector(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_splitting() {
        assert_eq!(split_selector("a/b"), ("a/b", ""));
        assert_eq!(split_selector("a/b?"), ("a/b", ""));
        assert_eq!(split_selector("a/b?x=1?y=2"), ("a/b", "x=1?y=2"));
        assert_eq!(split_selector("?x=1"), ("", "x=1"));
    }

    #[test]
    fn selector_parsing() {
        let selector = parse_selector("demo/example/**?a=1&b=2").unwrap();
        assert_eq!(selector.key_expr.as_str(), "demo/example/**");
        assert_eq!(selector.value_selector(), "a=1&b=2");

        let selector = parse_selector("demo//example").unwrap();
        assert_eq!(selector.key_expr.as_str(), "demo/example");
        assert_eq!(selector.value_selector(), "");
        assert_eq!(selector.to_string(), "demo/example");

        // Only the first `?` splits, the value selector is kept verbatim.
        let selector = parse_selector("a/b?x=1?y=2&x=3").unwrap();
        assert_eq!(selector.key_expr.as_str(), "a/b");
        assert_eq!(selector.value_selector(), "x=1?y=2&x=3");
        assert_eq!(selector.to_string(), "a/b?x=1?y=2&x=3");

        let err = parse_selector("a/b*?x=1").unwrap_err();
        assert!(matches!(err.kind(), ZErrorKind::InvalidKeyExpr { .. }));
        assert!(parse_selector("?x=1").is_err());
    }

    #[test]
    fn value_selector_decoding() {
        let decoded = decode_value_selector("a=1&b=2").unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded["a"], "1");
        assert_eq!(decoded["b"], "2");

        let decoded = decode_value_selector("flag&x=&&y=a%20b&z=1=2").unwrap();
        assert_eq!(decoded["flag"], "");
        assert_eq!(decoded["x"], "");
        assert_eq!(decoded["y"], "a b");
        assert_eq!(decoded["z"], "1=2");
        assert_eq!(decoded.len(), 4);

        assert!(decode_value_selector("").unwrap().is_empty());
    }

    #[test]
    fn value_selector_rejects_duplicates() {
        let err = decode_value_selector("a=1&a=2").unwrap_err();
        assert_eq!(
            err.kind(),
            &ZErrorKind::DuplicateParameter {
                key: "a".to_string(),
                value_selector: "a=1&a=2".to_string(),
            }
        );
        // Duplicates are detected on decoded keys.
        let err = decode_value_selector("b=0&%61=1&a=2").unwrap_err();
        assert!(matches!(err.kind(), ZErrorKind::DuplicateParameter { key, .. } if key == "a"));
        // The same key without value is still a duplicate.
        assert!(decode_value_selector("a&a").is_err());

        let err = decode_value_selector("=1&a=2").unwrap_err();
        assert!(matches!(err.kind(), ZErrorKind::MalformedPair { .. }));
    }

    #[test]
    fn selector_accessors() {
        let mut selector = Selector::try_from("hello/there").unwrap();
        selector.extend(&[("_time", "[..]"), ("name", "a&b")]);
        assert_eq!(selector.value_selector(), "_time=%5B..%5D&name=a%26b");
        let decoded = selector.decode_value_selector().unwrap();
        assert_eq!(decoded["_time"], "[..]");
        assert_eq!(decoded["name"], "a&b");

        let selector = selector.with_value_selector("x=1");
        assert_eq!(format!("{:?}", selector), "sel\"hello/there?x=1\"");
        let (key_expr, value_selector) = selector.split();
        assert_eq!(key_expr.as_str(), "hello/there");
        assert_eq!(value_selector, "x=1");
    }
}
