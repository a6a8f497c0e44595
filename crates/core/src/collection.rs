//! Typed collection: an ordered, indexed container of one entity type.

use std::collections::BTreeMap;
use std::ops::Index;

use serde_json::Value;

use crate::entity::Entity;
use crate::error::{MarshalError, MarshalResult};
use crate::field::{json_kind, Field};

/// Ordered container of `T` keyed by integer index.
///
/// Every element is a `T` built from raw input at insertion time; raw input
/// is never stored. Indices are insertion-order integers unless given
/// explicitly, and `unset` may leave gaps.
///
/// Iteration starts at index 0 and stops at the first missing index. Call
/// [`Collection::reindex`] after `unset` to iterate densely again.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: BTreeMap<usize, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a raw JSON array.
    pub fn from_raw(raw: &Value) -> MarshalResult<Self> {
        let mut collection = Self::new();
        collection.populate(raw)?;
        Ok(collection)
    }

    /// Build a densely indexed collection from already-typed items.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().enumerate().collect(),
        }
    }

    pub fn exists(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> MarshalResult<&T> {
        self.items
            .get(&index)
            .ok_or_else(|| MarshalError::out_of_range(index))
    }

    pub fn get_mut(&mut self, index: usize) -> MarshalResult<&mut T> {
        self.items
            .get_mut(&index)
            .ok_or_else(|| MarshalError::out_of_range(index))
    }

    /// Populate a new `T` from `raw` and store it.
    ///
    /// `None` appends one past the highest stored index. An existing element
    /// at the index is replaced. Returns the index used.
    ///
    /// Appending after an element stored at `usize::MAX` is an out-of-range
    /// error.
    pub fn set(&mut self, index: Option<usize>, raw: &Value) -> MarshalResult<usize> {
        let index = match index {
            Some(index) => index,
            None => self.next_index()?,
        };
        let item = T::from_raw(raw).map_err(|e| e.in_field(&index.to_string()))?;
        self.insert(Some(index), item)
    }

    /// Store an already-built item. Same indexing rules as [`Collection::set`].
    pub fn insert(&mut self, index: Option<usize>, item: T) -> MarshalResult<usize> {
        let index = match index {
            Some(index) => index,
            None => self.next_index()?,
        };
        if self.items.insert(index, item).is_some() {
            tracing::trace!(entity = T::TYPE_NAME, index, "replaced collection element");
        }
        Ok(index)
    }

    /// Remove the element at `index`; other indices are left untouched.
    pub fn unset(&mut self, index: usize) -> Option<T> {
        self.items.remove(&index)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor over indices `0, 1, 2, ...` up to the first gap.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            items: &self.items,
            cursor: 0,
        }
    }

    /// Every stored `(index, item)` pair in ascending order, gaps skipped.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.items.iter().map(|(index, item)| (*index, item))
    }

    /// Renumber elements to `0..count`, preserving order.
    pub fn reindex(&mut self) {
        let items = std::mem::take(&mut self.items);
        self.items = items.into_values().enumerate().collect();
    }

    /// Append every element of a raw JSON array, in order.
    ///
    /// `null` is a no-op.
    pub fn populate(&mut self, raw: &Value) -> MarshalResult<&mut Self> {
        match raw {
            Value::Null => {}
            Value::Array(elements) => {
                for element in elements {
                    self.set(None, element)?;
                }
            }
            other => {
                return Err(MarshalError::validation(format!(
                    "collection of {} expects an array, got {}",
                    T::TYPE_NAME,
                    json_kind(other)
                )));
            }
        }
        Ok(self)
    }

    /// Elements at indices `offset..stop`.
    ///
    /// `stop` is an exclusive end index (not a length) and defaults to
    /// [`Collection::count`]. A gap inside the range is an out-of-range error.
    pub fn slice(&self, offset: usize, stop: Option<usize>) -> MarshalResult<Vec<&T>> {
        let stop = stop.unwrap_or_else(|| self.count());
        (offset..stop).map(|index| self.get(index)).collect()
    }

    /// Elements matching `predicate`, in index order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.values().filter(|item| predicate(item)).collect()
    }

    /// Like [`Collection::filter`], materialized as a new dense collection.
    pub fn filter_collect<P>(&self, predicate: P) -> Self
    where
        T: Clone,
        P: FnMut(&T) -> bool,
    {
        Self::from_items(self.filter(predicate).into_iter().cloned())
    }

    /// JSON array of every element's own encoded value, in index order.
    pub fn encode_value(&self, allow_null: bool) -> MarshalResult<Value> {
        self.items
            .iter()
            .map(|(index, item)| {
                item.encode_value(allow_null)
                    .map_err(|e| e.in_field(&index.to_string()))
            })
            .collect::<MarshalResult<Vec<_>>>()
            .map(Value::Array)
    }

    pub fn encode(&self, allow_null: bool) -> MarshalResult<String> {
        Ok(serde_json::to_string(&self.encode_value(allow_null)?)?)
    }

    fn next_index(&self) -> MarshalResult<usize> {
        match self.items.last_key_value() {
            None => Ok(0),
            Some((&last, _)) => last
                .checked_add(1)
                .ok_or_else(|| MarshalError::out_of_range(last)),
        }
    }
}

/// Iterator returned by [`Collection::iter`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    items: &'a BTreeMap<usize, T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(&self.cursor)?;
        self.cursor += 1;
        Some(item)
    }
}

impl<'a, T: Entity> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Entity> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<T: Entity> Index<usize> for Collection<T> {
    type Output = T;

    /// Panics when no element is stored at `index`, like slice indexing.
    fn index(&self, index: usize) -> &Self::Output {
        match self.items.get(&index) {
            Some(item) => item,
            None => panic!("index {index} out of range for collection of {}", T::TYPE_NAME),
        }
    }
}

impl<T: Entity> Field for Collection<T> {
    fn assign(&mut self, raw: &Value) -> MarshalResult<()> {
        let mut fresh = Self::new();
        fresh.populate(raw)?;
        *self = fresh;
        Ok(())
    }

    fn flatten(&self, allow_null: bool) -> MarshalResult<Value> {
        self.encode_value(allow_null)
    }

    fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}
