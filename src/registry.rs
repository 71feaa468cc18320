//! Instance Registries
//!
//! Growable, index-addressable sequences, each guarded by its own lock.
//! Every dictionary collection (attributes, rules, interface items,
//! supertypes, select choices) is one of these.
//!
//! Ownership is decided by the wrapper type:
//! - [`OwningRegistry`] holds its elements behind `Arc` and drops its share on
//!   `clear()`, `remove()` and teardown.
//! - [`RefRegistry`] holds arena [`Handle`]s. Handles are `Copy`, so they can
//!   never carry a destructor and clearing the registry never frees anything.
//!
//! There is no lock shared between registries. Algorithms that walk several
//! registries are only atomic per registry.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{DictionaryError, Result};

/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: usize = 16;

/// Highest slot an out-of-order write may reach
pub const MAX_CAPACITY: usize = 1 << 24;

/// What happens on a write past the logical end of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPolicy {
    /// Reject writes with `index > count()`
    #[default]
    Strict,
    /// Extend the logical length to `index + 1`; skipped slots stay vacant
    Extend,
}

/// Marker for arena handles stored in a [`RefRegistry`]
pub trait Handle: Copy + Eq + fmt::Debug + Send + Sync + 'static {}

// =============================================================================
// Slot storage
// =============================================================================

struct Slots<T> {
    /// Physical storage; `buf.len()` is the capacity
    buf: Vec<Option<T>>,
    /// Logical length
    count: usize,
    policy: IndexPolicy,
}

impl<T> Slots<T> {
    fn new(capacity: usize, policy: IndexPolicy) -> Self {
        let mut buf = Vec::new();
        buf.resize_with(capacity.clamp(1, MAX_CAPACITY), || None);
        Self { buf, count: 0, policy }
    }

    /// Grow so that `index` is addressable. Capacity never shrinks.
    fn reserve_index(&mut self, index: usize) {
        let capacity = self.buf.len();
        if index >= capacity {
            let new_capacity = index.saturating_add(1).saturating_mul(2).max(capacity.saturating_mul(2));
            debug!(from = capacity, to = new_capacity, "growing registry");
            self.buf.resize_with(new_capacity, || None);
        }
    }

    fn insert(&mut self, index: usize, value: T) {
        self.reserve_index(self.count);
        let count = self.count;
        self.buf[index..=count].rotate_right(1);
        self.buf[index] = Some(value);
        self.count += 1;
    }

    /// Slots that do not exist yet must lie below [`MAX_CAPACITY`]
    fn write(&mut self, index: usize, value: T) -> Result<()> {
        if index >= MAX_CAPACITY.max(self.buf.len()) {
            return Err(DictionaryError::IndexOutOfRange {
                index,
                len: self.count,
            });
        }
        self.reserve_index(index);
        self.buf[index] = Some(value);
        self.count = self.count.max(index + 1);
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        let removed = self.buf[index].take();
        let count = self.count;
        self.buf[index..count].rotate_left(1);
        self.count -= 1;
        removed
    }

    fn live(&self) -> impl Iterator<Item = &T> {
        self.buf[..self.count].iter().flatten()
    }

    fn clear(&mut self) -> usize {
        let dropped = self.buf[..self.count].iter_mut().filter_map(Option::take).count();
        self.count = 0;
        dropped
    }
}

// =============================================================================
// InstanceRegistry
// =============================================================================

/// Lock-protected growable array shared by both registry flavours
pub struct InstanceRegistry<T> {
    slots: Mutex<Slots<T>>,
}

impl<T: Clone> InstanceRegistry<T> {
    /// Create a registry with the given initial capacity and index policy
    pub fn new(capacity: usize, policy: IndexPolicy) -> Self {
        Self {
            slots: Mutex::new(Slots::new(capacity, policy)),
        }
    }

    /// The index policy this registry enforces
    pub fn policy(&self) -> IndexPolicy {
        self.slots.lock().policy
    }

    /// Switch to `options`, keeping the current contents. Capacity only grows.
    pub fn apply_options(&self, options: RegistryConfig) {
        let mut slots = self.slots.lock();
        slots.policy = options.index_policy;
        let wanted = options.initial_capacity.min(MAX_CAPACITY);
        if wanted > 0 {
            slots.reserve_index(wanted - 1);
        }
    }

    /// Insert at `index`, shifting later elements up; `None` appends.
    ///
    /// Returns the index the value landed at. The grow-and-shift happens
    /// under a single lock acquisition.
    pub fn insert(&self, value: T, index: Option<usize>) -> Result<usize> {
        let mut slots = self.slots.lock();
        let count = slots.count;
        match index {
            None => {
                slots.insert(count, value);
                Ok(count)
            }
            Some(i) if i <= count => {
                slots.insert(i, value);
                Ok(i)
            }
            Some(i) => match slots.policy {
                IndexPolicy::Strict => Err(DictionaryError::IndexOutOfRange { index: i, len: count }),
                IndexPolicy::Extend => {
                    slots.write(i, value)?;
                    Ok(i)
                }
            },
        }
    }

    /// Append at the end, returning the new element's index
    pub fn append(&self, value: T) -> usize {
        let mut slots = self.slots.lock();
        let count = slots.count;
        slots.insert(count, value);
        count
    }

    /// Remove the element at `index`, shifting later elements down.
    ///
    /// Out-of-range indices are a no-op and return `None`.
    pub fn remove(&self, index: usize) -> Option<T> {
        self.slots.lock().remove(index)
    }

    /// First index whose element satisfies `pred`
    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        let slots = self.slots.lock();
        slots.buf[..slots.count]
            .iter()
            .position(|slot| slot.as_ref().is_some_and(&mut pred))
    }

    /// Element at `index`; vacant and out-of-range slots read as `None`
    pub fn get(&self, index: usize) -> Option<T> {
        let slots = self.slots.lock();
        if index < slots.count {
            slots.buf[index].clone()
        } else {
            None
        }
    }

    /// Overwrite the slot at `index`.
    ///
    /// `index == count()` appends. Beyond that the registry's
    /// [`IndexPolicy`] decides between rejecting the write and extending.
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        let mut slots = self.slots.lock();
        let count = slots.count;
        if index > count && slots.policy == IndexPolicy::Strict {
            return Err(DictionaryError::IndexOutOfRange { index, len: count });
        }
        slots.write(index, value)
    }

    /// Logical length, read under the lock
    pub fn count(&self) -> usize {
        self.slots.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Physical capacity
    pub fn capacity(&self) -> usize {
        self.slots.lock().buf.len()
    }

    /// Reset the logical length to zero, returning how many values were dropped
    pub fn clear(&self) -> usize {
        self.slots.lock().clear()
    }

    /// Run `f` over the live elements while holding the lock for the whole pass
    pub fn with_items<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &T>) -> R) -> R {
        let slots = self.slots.lock();
        let mut items = slots.live();
        f(&mut items)
    }

    /// Clone the live elements out
    pub fn snapshot(&self) -> Vec<T> {
        self.with_items(|items| items.cloned().collect())
    }
}

impl<T> fmt::Debug for InstanceRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("InstanceRegistry")
            .field("count", &slots.count)
            .field("capacity", &slots.buf.len())
            .field("policy", &slots.policy)
            .finish()
    }
}

// =============================================================================
// OwningRegistry
// =============================================================================

/// Registry that owns its elements
///
/// Identity is pointer identity of the stored `Arc`.
pub struct OwningRegistry<T> {
    inner: InstanceRegistry<Arc<T>>,
}

impl<T> OwningRegistry<T> {
    pub fn new(capacity: usize, policy: IndexPolicy) -> Self {
        Self { inner: InstanceRegistry::new(capacity, policy) }
    }

    /// Take ownership of `value` and append it
    pub fn append(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.inner.append(Arc::clone(&value));
        value
    }

    /// Take ownership of `value` and insert it at `index` (`None` appends)
    pub fn insert(&self, value: T, index: Option<usize>) -> Result<Arc<T>> {
        let value = Arc::new(value);
        self.inner.insert(Arc::clone(&value), index)?;
        Ok(value)
    }

    pub fn set(&self, index: usize, value: T) -> Result<()> {
        self.inner.set(index, Arc::new(value))
    }

    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.inner.get(index)
    }

    /// Remove and hand back the element at `index`
    pub fn remove(&self, index: usize) -> Option<Arc<T>> {
        self.inner.remove(index)
    }

    pub fn index_of(&self, value: &Arc<T>) -> Option<usize> {
        self.inner.position(|item| Arc::ptr_eq(item, value))
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn policy(&self) -> IndexPolicy {
        self.inner.policy()
    }

    pub fn apply_options(&self, options: RegistryConfig) {
        self.inner.apply_options(options);
    }

    /// Drop every element
    pub fn clear(&self) -> usize {
        self.inner.clear()
    }

    pub fn with_items<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Arc<T>>) -> R) -> R {
        self.inner.with_items(f)
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.inner.snapshot()
    }
}

impl<T> Default for OwningRegistry<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, IndexPolicy::default())
    }
}

impl<T> fmt::Debug for OwningRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwningRegistry").field(&self.inner).finish()
    }
}

// =============================================================================
// RefRegistry
// =============================================================================

/// Registry of non-owning arena handles
///
/// Identity is handle equality.
pub struct RefRegistry<H: Handle> {
    inner: InstanceRegistry<H>,
}

impl<H: Handle> RefRegistry<H> {
    pub fn new(capacity: usize, policy: IndexPolicy) -> Self {
        Self { inner: InstanceRegistry::new(capacity, policy) }
    }

    pub fn append(&self, handle: H) -> usize {
        self.inner.append(handle)
    }

    pub fn insert(&self, handle: H, index: Option<usize>) -> Result<usize> {
        self.inner.insert(handle, index)
    }

    pub fn set(&self, index: usize, handle: H) -> Result<()> {
        self.inner.set(index, handle)
    }

    pub fn get(&self, index: usize) -> Option<H> {
        self.inner.get(index)
    }

    pub fn remove(&self, index: usize) -> Option<H> {
        self.inner.remove(index)
    }

    pub fn index_of(&self, handle: H) -> Option<usize> {
        self.inner.position(|item| *item == handle)
    }

    pub fn contains(&self, handle: H) -> bool {
        self.index_of(handle).is_some()
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn policy(&self) -> IndexPolicy {
        self.inner.policy()
    }

    pub fn apply_options(&self, options: RegistryConfig) {
        self.inner.apply_options(options);
    }

    /// Forget every handle; the referenced objects are untouched
    pub fn clear(&self) -> usize {
        self.inner.clear()
    }

    pub fn with_items<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &H>) -> R) -> R {
        self.inner.with_items(f)
    }

    pub fn snapshot(&self) -> Vec<H> {
        self.inner.snapshot()
    }
}

impl<H: Handle> Default for RefRegistry<H> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, IndexPolicy::default())
    }
}

impl<H: Handle> fmt::Debug for RefRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefRegistry").field(&self.snapshot()).finish()
    }
}
