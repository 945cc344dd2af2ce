//! A reference-counted multimap entry store.
//!
//! Entries stay in the map when their count drops to zero ("weak"), so that a decrement followed by an increment in the same pass doesn't churn.
//! [`RcHashMap::drain_weak`] then removes all of them at once.

use core::{
	borrow::Borrow,
	hash::{BuildHasher, Hash},
};
use hashbrown::{
	hash_map::{DefaultHashBuilder, Entry},
	HashMap,
};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

#[derive(Debug, Clone)]
pub struct RcHashMap<K, C, V, S = DefaultHashBuilder>(HashMap<K, (C, V), S>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher;
impl<K, C, V, S> Default for RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	/// # Errors
	///
	/// Iff the count for `k` would overflow `C`.
	pub fn increment_or_insert_with<F: FnOnce() -> V>(&mut self, k: K, v: F) -> Result<&mut V, CountSaturatedError> {
		match self.0.entry(k) {
			Entry::Occupied(occupied) => {
				let (c, v) = occupied.into_mut();
				*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok(v)
			}
			Entry::Vacant(vacant) => {
				let (_, v) = vacant.insert((C::one(), v()));
				Ok(v)
			}
		}
	}

	/// Decrements the count for `k` without removing the entry.
	///
	/// # Errors
	///
	/// Iff the count for `k` already was zero.
	pub fn weak_decrement<Q: ?Sized>(&mut self, k: &Q) -> Result<Option<&mut V>, CountSaturatedError>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		match self.0.get_mut(k) {
			Some((c, v)) => {
				*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				Ok(Some(v))
			}
			None => Ok(None),
		}
	}

	/// The value for `k`, if its count is not zero.
	pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.get(k).filter(|(c, _)| !c.is_zero()).map(|(_, v)| v)
	}

	/// Keys with a non-zero count.
	pub fn strong_keys(&self) -> impl Iterator<Item = &K> + '_ {
		self.0.iter().filter(|(_, (c, _))| !c.is_zero()).map(|(k, _)| k)
	}

	/// Removes and returns every entry whose count is zero.
	pub fn drain_weak(&mut self) -> Vec<(K, V)>
	where
		K: Clone,
	{
		let weak: Vec<K> = self.0.iter().filter(|(_, (c, _))| c.is_zero()).map(|(k, _)| k.clone()).collect();
		weak.into_iter().filter_map(|k| self.0.remove_entry(&k)).map(|(k, (_, v))| (k, v)).collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSaturatedError;
