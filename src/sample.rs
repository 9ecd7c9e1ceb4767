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

//! Sample primitives
use crate::core::ZResult;
use crate::key_expr::KeyExpr;
use std::borrow::Cow;
use std::convert::TryInto;
use std::fmt;

/// The timestamp of a [`Sample`], produced by a hybrid logical clock.
pub use uhlc::Timestamp;

/// Known encoding prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownEncoding {
    Empty,
    AppOctetStream,
    AppJson,
    AppInteger,
    AppFloat,
    TextPlain,
    TextJson,
}

impl KnownEncoding {
    fn as_str(&self) -> &'static str {
        match self {
            KnownEncoding::Empty => "",
            KnownEncoding::AppOctetStream => "application/octet-stream",
            KnownEncoding::AppJson => "application/json",
            KnownEncoding::AppInteger => "application/integer",
            KnownEncoding::AppFloat => "application/float",
            KnownEncoding::TextPlain => "text/plain",
            KnownEncoding::TextJson => "text/json",
        }
    }
}

/// The encoding of a [`Value`]: a known prefix and an optional free-form suffix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Encoding {
    pub prefix: KnownEncoding,
    pub suffix: Cow<'static, str>,
}

impl Encoding {
    pub const EMPTY: Encoding = Encoding::exact(KnownEncoding::Empty);
    pub const APP_OCTET_STREAM: Encoding = Encoding::exact(KnownEncoding::AppOctetStream);
    pub const APP_JSON: Encoding = Encoding::exact(KnownEncoding::AppJson);
    pub const APP_INTEGER: Encoding = Encoding::exact(KnownEncoding::AppInteger);
    pub const APP_FLOAT: Encoding = Encoding::exact(KnownEncoding::AppFloat);
    pub const TEXT_PLAIN: Encoding = Encoding::exact(KnownEncoding::TextPlain);
    pub const TEXT_JSON: Encoding = Encoding::exact(KnownEncoding::TextJson);

    pub const fn exact(prefix: KnownEncoding) -> Self {
        Encoding {
            prefix,
            suffix: Cow::Borrowed(""),
        }
    }

    /// Sets the suffix of this encoding.
    pub fn with_suffix<IntoCowStr>(mut self, suffix: IntoCowStr) -> Self
    where
        IntoCowStr: Into<Cow<'static, str>>,
    {
        self.suffix = suffix.into();
        self
    }

    /// Returns `true` if the string representation of this encoding starts with
    /// the string representation of the other given encoding.
    pub fn starts_with(&self, with: &Encoding) -> bool {
        self.to_string().starts_with(&with.to_string())
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::EMPTY
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix.as_str())?;
        f.write_str(&self.suffix)
    }
}

/// A zenoh Value: a payload and the [`Encoding`] telling how to interpret it.
#[derive(Clone, PartialEq, Eq)]
pub struct Value {
    /// The payload of this Value.
    pub payload: Vec<u8>,
    /// An encoding description indicating how the associated payload is encoded.
    pub encoding: Encoding,
}

impl Value {
    /// Creates a new zenoh Value.
    pub fn new(payload: Vec<u8>) -> Self {
        Value {
            payload,
            encoding: Encoding::APP_OCTET_STREAM,
        }
    }

    /// Creates an empty Value.
    pub fn empty() -> Self {
        Value {
            payload: Vec::new(),
            encoding: Encoding::EMPTY,
        }
    }

    /// Sets the encoding of this zenoh Value.
    #[inline(always)]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns the payload as a string if the encoding is a textual one.
    pub fn as_string(&self) -> Option<String> {
        if self.encoding.starts_with(&Encoding::TEXT_PLAIN)
            || self.encoding.starts_with(&Encoding::APP_JSON)
            || self.encoding.starts_with(&Encoding::TEXT_JSON)
        {
            Some(String::from_utf8_lossy(&self.payload).into_owned())
        } else {
            None
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Value{{ payload: {} bytes, encoding: {} }}",
            self.payload.len(),
            self.encoding
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.payload))
    }
}

impl From<Vec<u8>> for Value {
    fn from(buf: Vec<u8>) -> Self {
        Value::new(buf)
    }
}

impl From<&[u8]> for Value {
    fn from(buf: &[u8]) -> Self {
        Value::new(buf.to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value {
            payload: s.into_bytes(),
            encoding: Encoding::TEXT_PLAIN,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value {
            payload: i.to_string().into_bytes(),
            encoding: Encoding::APP_INTEGER,
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value {
            payload: f.to_string().into_bytes(),
            encoding: Encoding::APP_FLOAT,
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value {
            payload: json.to_string().into_bytes(),
            encoding: Encoding::APP_JSON,
        }
    }
}

/// The kind of a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// if the [`Sample`] was caused by a `put` operation.
    Put,
    /// if the [`Sample`] was caused by a `delete` operation.
    Delete,
}

impl Default for SampleKind {
    fn default() -> Self {
        SampleKind::Put
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKind::Put => write!(f, "PUT"),
            SampleKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A zenoh sample: the unit carried by query replies.
#[derive(Clone, Debug)]
pub struct Sample {
    /// The key expression on which this Sample was published.
    pub key_expr: KeyExpr,
    /// The value of this Sample.
    pub value: Value,
    /// The kind of this Sample.
    pub kind: SampleKind,
    /// The [`Timestamp`] of this Sample.
    pub timestamp: Option<Timestamp>,
}

impl Sample {
    /// Creates a new Sample.
    #[inline]
    pub fn new<IntoValue>(key_expr: KeyExpr, value: IntoValue) -> Self
    where
        IntoValue: Into<Value>,
    {
        Sample {
            key_expr,
            value: value.into(),
            kind: SampleKind::default(),
            timestamp: None,
        }
    }

    /// Creates a new Sample, parsing the given key expression.
    #[inline]
    pub fn try_from<TryIntoKeyExpr, IntoValue>(
        key_expr: TryIntoKeyExpr,
        value: IntoValue,
    ) -> ZResult<Self>
    where
        TryIntoKeyExpr: TryInto<KeyExpr>,
        <TryIntoKeyExpr as TryInto<KeyExpr>>::Error: Into<crate::core::ZError>,
        IntoValue: Into<Value>,
    {
        Ok(Sample::new(key_expr.try_into().map_err(Into::into)?, value))
    }

    /// Sets the timestamp of this Sample.
    #[inline]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the kind of this Sample.
    #[inline]
    pub fn with_kind(mut self, kind: SampleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Stamps this Sample with the given clock if it carries no timestamp yet.
    pub fn ensure_timestamp(&mut self, hlc: &uhlc::HLC) -> &Timestamp {
        self.timestamp.get_or_insert_with(|| hlc.new_timestamp())
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SampleKind::Delete => write!(f, "{}({})", self.kind, self.key_expr),
            _ => write!(f, "{}({}: {})", self.kind, self.key_expr, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_and_encodings() {
        let v = Value::from("hello");
        assert_eq!(v.encoding, Encoding::TEXT_PLAIN);
        assert_eq!(v.as_string().as_deref(), Some("hello"));
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert!(Value::from(vec![0u8, 1, 2]).as_string().is_none());

        let enc = Encoding::TEXT_PLAIN.with_suffix(";charset=utf-8");
        assert_eq!(enc.to_string(), "text/plain;charset=utf-8");
        assert!(enc.starts_with(&Encoding::TEXT_PLAIN));
        assert!(!enc.starts_with(&Encoding::APP_JSON));
    }

    #[test]
    fn sample_timestamping() {
        let hlc = uhlc::HLC::default();
        let mut sample = Sample::try_from("demo/example", "value").unwrap();
        assert!(sample.timestamp.is_none());
        let ts = sample.ensure_timestamp(&hlc).clone();
        // An existing timestamp is never replaced.
        assert_eq!(sample.ensure_timestamp(&hlc), &ts);
        assert_eq!(sample.to_string(), "PUT(demo/example: value)");
        assert!(Sample::try_from("demo/example?x", "value").is_err());
    }
}
