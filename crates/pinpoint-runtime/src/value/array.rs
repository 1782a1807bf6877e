//! Ordered arrays.

#![allow(missing_docs)]

use std::cmp::Ordering;
use std::convert::Infallible;

use indexmap::IndexMap;
use pinpoint_debug::ArrayKey;
use smol_str::SmolStr;

use super::Value;

/// An ordered hash map with integer or string keys.
///
/// Arrays have value semantics: [`Value::Array`] shares storage through an
/// `Rc` and copies on the first write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayValue {
    entries: IndexMap<ArrayKey, Value>,
    next_index: i64,
}

impl ArrayValue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list with keys `0..n`.
    pub fn from_list(values: impl IntoIterator<Item = Value>) -> Self {
        let mut array = Self::new();
        for value in values {
            array.push(value);
        }
        array
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: ArrayKey, value: Value) {
        self.bump_next_index(&key);
        self.entries.insert(key, value);
    }

    /// Appends with the next free integer key.
    pub fn push(&mut self, value: Value) {
        let key = ArrayKey::Int(self.next_index);
        self.insert(key, value);
    }

    /// Slot for `key`, or for the next free integer key when `key` is
    /// `None`. Missing slots are created holding `null`.
    pub fn slot(&mut self, key: Option<ArrayKey>) -> &mut Value {
        let key = key.unwrap_or(ArrayKey::Int(self.next_index));
        self.bump_next_index(&key);
        self.entries.entry(key).or_insert(Value::Null)
    }

    pub fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn pop(&mut self) -> Option<Value> {
        let (_, value) = self.entries.pop()?;
        self.next_index = self.max_int_key().map_or(0, |max| max + 1);
        Some(value)
    }

    /// Removes the first entry and renumbers integer keys from zero.
    pub fn shift(&mut self) -> Option<Value> {
        let (_, value) = self.entries.shift_remove_index(0)?;
        self.renumber();
        Some(value)
    }

    /// Prepends `values` and renumbers integer keys from zero.
    pub fn unshift(&mut self, values: Vec<Value>) {
        let old = std::mem::take(&mut self.entries);
        self.next_index = 0;
        for value in values {
            self.push(value);
        }
        for (key, value) in old {
            match key {
                ArrayKey::Int(_) => self.push(value),
                ArrayKey::String(_) => self.insert(key, value),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    #[must_use]
    pub fn first_key(&self) -> Option<&ArrayKey> {
        self.entries.first().map(|(key, _)| key)
    }

    #[must_use]
    pub fn last_key(&self) -> Option<&ArrayKey> {
        self.entries.last().map(|(key, _)| key)
    }

    /// Returns true for keys `0..n` in order.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(index, key)| matches!(key, ArrayKey::Int(value) if usize::try_from(*value).ok() == Some(index)))
    }

    /// Reorders entries by value and renumbers keys.
    pub fn sort_values(&mut self, descending: bool) {
        let values: Vec<Value> = std::mem::take(&mut self.entries).into_values().collect();
        let values = merge_sort_by(values, &mut |a: &Value, b: &Value| {
            Ok::<_, Infallible>(directed(a.compare(b), descending))
        })
        .unwrap_or_else(|never| match never {});
        self.next_index = 0;
        for value in values {
            self.push(value);
        }
    }

    /// Reorders entries by key, keeping the key association.
    pub fn sort_keys(&mut self, descending: bool) {
        let entries: Vec<(ArrayKey, Value)> = std::mem::take(&mut self.entries).into_iter().collect();
        let entries = merge_sort_by(entries, &mut |(a, _): &(ArrayKey, Value), (b, _): &(ArrayKey, Value)| {
            let ordering = Value::from(a.clone()).compare(&Value::from(b.clone()));
            Ok::<_, Infallible>(directed(ordering, descending))
        })
        .unwrap_or_else(|never| match never {});
        self.entries = entries.into_iter().collect();
    }

    fn renumber(&mut self) {
        let old = std::mem::take(&mut self.entries);
        self.next_index = 0;
        for (key, value) in old {
            match key {
                ArrayKey::Int(_) => self.push(value),
                ArrayKey::String(_) => self.insert(key, value),
            }
        }
    }

    fn bump_next_index(&mut self, key: &ArrayKey) {
        if let ArrayKey::Int(index) = key {
            if *index >= self.next_index {
                self.next_index = index.saturating_add(1);
            }
        }
    }

    fn max_int_key(&self) -> Option<i64> {
        self.entries
            .keys()
            .filter_map(|key| match key {
                ArrayKey::Int(value) => Some(*value),
                ArrayKey::String(_) => None,
            })
            .max()
    }
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Stable merge sort with a fallible comparator. Unlike `slice::sort_by`
/// it accepts comparators that are not a total order.
pub fn merge_sort_by<T, E, F>(items: Vec<T>, compare: &mut F) -> Result<Vec<T>, E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_by(left, compare)?;
    let right = merge_sort_by(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        if compare(b, a)? == Ordering::Less {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

impl FromIterator<(ArrayKey, Value)> for ArrayValue {
    fn from_iter<T: IntoIterator<Item = (ArrayKey, Value)>>(iter: T) -> Self {
        let mut array = Self::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

/// Normalizes a string key: canonical decimal integers become integer keys.
#[must_use]
pub fn string_key(text: &str) -> ArrayKey {
    let canonical = !text.is_empty()
        && (text == "0" || !text.starts_with('0'))
        && !text.starts_with("-0")
        && !text.starts_with('+');
    if canonical {
        if let Ok(value) = text.parse::<i64>() {
            return ArrayKey::Int(value);
        }
    }
    ArrayKey::String(SmolStr::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_follows_largest_int_key() {
        let mut array = ArrayValue::new();
        array.insert(ArrayKey::Int(5), Value::Int(1));
        array.insert(ArrayKey::String("k".into()), Value::Int(2));
        array.push(Value::Int(3));
        assert_eq!(array.last_key(), Some(&ArrayKey::Int(6)));
    }

    #[test]
    fn test_string_key_normalization() {
        assert_eq!(string_key("12"), ArrayKey::Int(12));
        assert_eq!(string_key("-3"), ArrayKey::Int(-3));
        assert_eq!(string_key("012"), ArrayKey::String("012".into()));
        assert_eq!(string_key("1.5"), ArrayKey::String("1.5".into()));
        assert_eq!(string_key(""), ArrayKey::String("".into()));
    }

    #[test]
    fn test_shift_renumbers() {
        let mut array = ArrayValue::from_list([Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(array.shift(), Some(Value::Int(1)));
        assert_eq!(array.first_key(), Some(&ArrayKey::Int(0)));
        assert!(array.is_list());
    }

    #[test]
    fn test_sort_values() {
        let mut array = ArrayValue::from_list([Value::Int(3), Value::Int(1), Value::Int(2)]);
        array.sort_values(false);
        let values: Vec<_> = array.values().cloned().collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_merge_sort_is_stable_and_propagates_errors() {
        let items = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let sorted = merge_sort_by(items, &mut |a: &(i32, char), b: &(i32, char)| {
            Ok::<_, ()>(a.0.cmp(&b.0))
        })
        .unwrap();
        assert_eq!(sorted, vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);

        let failed = merge_sort_by(vec![2, 1], &mut |_: &i32, _: &i32| Err("boom"));
        assert_eq!(failed, Err("boom"));
    }
}
