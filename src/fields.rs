// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-excerpt.
//
// tracing-excerpt is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-excerpt is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-excerpt.  If
// not, see <http://www.gnu.org/licenses/>.

//! Record attributes & the rules for merging them.
//!
//! # Introduction
//!
//! [`Fields`] is the working set of attributes for a single record: an insertion-ordered map
//! from key _text_ to [`Marshaler`]. Keys are unique by their text, so `"7"` and `7u8` name the
//! same attribute.
//!
//! [`merge`] populates a [`Fields`] instance from three sources, in this order:
//!
//! 1. static attributes, fixed when the [`Encoder`] was built
//! 2. lazy attributes, computed at write time; a lazy attribute never replaces one already
//!    present
//! 3. per-call attributes, which replace anything already present
//!
//! [`Encoder`]: crate::encoder::Encoder

use crate::{
    error::{Error, Result},
    marshal::Marshaler,
    pool::Reset,
    text::quote_bytes,
};

use bytes::BufMut;

/// A zero-argument function producing an attribute at write time.
pub type LazyKv = Box<dyn Fn() -> (Marshaler, Marshaler) + Send + Sync>;

/// Render `key` to the text under which it is stored; `null` keys are the empty key.
pub fn key_text(key: &Marshaler) -> Result<Vec<u8>> {
    key.marshal_text()
        .map(|text| text.map(|cow| cow.into_owned()).unwrap_or_default())
        .map_err(Error::key)
}

/// An insertion-ordered attribute map.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    entries: Vec<(Vec<u8>, Marshaler)>,
}

impl Reset for Fields {
    fn reset(&mut self) {
        self.entries.clear()
    }
}

impl Fields {
    fn position(&self, key: &[u8]) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn contains(&self, key: &[u8]) -> bool {
        self.position(key).is_some()
    }
    pub fn get(&self, key: &[u8]) -> Option<&Marshaler> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }
    /// Insert, replacing (in place) any value already stored under `key`.
    pub fn insert(&mut self, key: Vec<u8>, value: Marshaler) -> Option<Marshaler> {
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }
    /// Insert only if nothing is stored under `key`; returns true if `value` was inserted.
    pub fn insert_absent(&mut self, key: &[u8], value: Marshaler) -> bool {
        if self.contains(key) {
            false
        } else {
            self.entries.push((key.to_vec(), value));
            true
        }
    }
    /// Append these attributes to `dst` as a JSON object.
    pub fn marshal_json(&self, dst: &mut Vec<u8>) -> Result<()> {
        dst.put_u8(b'{');
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                dst.put_u8(b',');
            }
            quote_bytes(key, dst);
            dst.put_u8(b':');
            value.marshal_json(dst)?;
        }
        dst.put_u8(b'}');
        Ok(())
    }
}

/// Merge static, lazy & per-call attributes into `dst`.
///
/// Any key that fails to render fails the merge; `dst` should then be discarded.
pub fn merge<I>(
    dst: &mut Fields,
    statics: &[(Marshaler, Marshaler)],
    lazies: &[LazyKv],
    per_call: I,
) -> Result<()>
where
    I: IntoIterator<Item = (Marshaler, Marshaler)>,
{
    for (key, value) in statics {
        dst.insert(key_text(key)?, value.clone());
    }
    for lazy in lazies {
        let (key, value) = lazy();
        dst.insert_absent(&key_text(&key)?, value);
    }
    for (key, value) in per_call {
        dst.insert(key_text(&key)?, value);
    }
    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;

    fn kv<K: Into<Marshaler>, V: Into<Marshaler>>(k: K, v: V) -> (Marshaler, Marshaler) {
        (k.into(), v.into())
    }

    fn json(fields: &Fields) -> String {
        let mut buf = Vec::new();
        fields.marshal_json(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn ordered_map() {
        let mut f = Fields::default();
        assert!(f.insert(b"b".to_vec(), 1.into()).is_none());
        assert!(f.insert(b"a".to_vec(), 2.into()).is_none());
        assert_eq!(f.insert(b"b".to_vec(), 3.into()), Some(Marshaler::I32(1)));
        assert!(!f.insert_absent(b"a", 4.into()));
        assert!(f.insert_absent(b"c", 5.into()));
        assert_eq!(json(&f), r#"{"b":3,"a":2,"c":5}"#);
        assert_eq!(f.len(), 3);
        f.reset();
        assert!(f.is_empty());
        assert_eq!(json(&f), "{}");
    }

    #[test]
    fn keys_are_unique_by_text() {
        let mut f = Fields::default();
        merge(&mut f, &[kv("7", "seven")], &[], vec![kv(7u8, "SEVEN")]).unwrap();
        assert_eq!(json(&f), r#"{"7":"SEVEN"}"#);
        // null keys are the empty key, as are unset structural keys
        merge(&mut f, &[], &[], vec![kv(None::<i32>, 1), kv(Marshaler::default(), 2)]).unwrap();
        assert_eq!(json(&f), r#"{"7":"SEVEN","":2}"#);
    }

    #[test]
    fn precedence() {
        let statics = vec![kv("version", "1.1"), kv("app", "static")];
        let lazies: Vec<LazyKv> = vec![
            Box::new(|| kv("version", "lazy")),
            Box::new(|| kv("timestamp", 1234)),
        ];
        let mut f = Fields::default();
        merge(
            &mut f,
            &statics,
            &lazies,
            vec![kv("app", "per-call"), kv("timestamp", 99)],
        )
        .unwrap();
        assert_eq!(
            json(&f),
            r#"{"version":"1.1","app":"per-call","timestamp":99}"#
        );
    }

    #[test]
    fn key_errors_fail_the_merge() {
        let mut bad = std::collections::BTreeMap::new();
        bad.insert(vec![0u8], 0);
        let mut f = Fields::default();
        let per_call = vec![(Marshaler::reflect(&bad), Marshaler::from(1))];
        let err = merge(&mut f, &[], &[], per_call).unwrap_err();
        assert!(matches!(err, Error::KeyEncoding { .. }));
    }

    #[test]
    fn value_errors_surface_when_marshalled() {
        let mut f = Fields::default();
        f.insert(b"ok".to_vec(), 1.into());
        f.insert(b"bad".to_vec(), Marshaler::raw(Some("{nope")));
        let mut buf = Vec::new();
        assert!(matches!(
            f.marshal_json(&mut buf),
            Err(Error::ValueEncoding { .. })
        ));
    }
}
