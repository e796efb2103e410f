//! A fixed-capacity reordering buffer keyed by a monotonic sequence number.
//!
//! Consumers feed it objects as they arrive, possibly out of order, and get
//! them back in sequence once the buffer has filled. It reports how each
//! insert relates to the release sequence: still filling, in order, after a
//! gap, or too late to matter.
use std::collections::BTreeMap;

/// How an inserted item relates to the release sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GapKind {
	/// The buffer has not filled up yet; nothing is released.
	FillingBuffer,

	/// The released item directly follows the previous one.
	NoGap,

	/// Items were skipped; `size` is how many.
	Gap,

	/// The item's sequence was already passed; `size` is how far behind.
	ArrivedLate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GapInfo {
	pub kind: GapKind,
	pub size: u64,
}

/// A reordering buffer of fixed capacity.
pub struct Dejitter<T> {
	buffer: BTreeMap<u64, T>,
	capacity: usize,
	last_released: Option<u64>,
}

impl<T> Dejitter<T> {
	/// Create a buffer that absorbs `capacity` items before releasing any.
	///
	/// The capacity must not be zero.
	pub fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "dejitter capacity must be non-zero");

		Self {
			buffer: BTreeMap::new(),
			capacity,
			last_released: None,
		}
	}

	pub fn len(&self) -> usize {
		self.buffer.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buffer.is_empty()
	}

	/// Insert an item, possibly releasing the next in-order item.
	///
	/// Sequences at or before the last released item are dropped as late.
	pub fn insert(&mut self, sequence: u64, item: T) -> (Option<T>, GapInfo) {
		if let Some(last) = self.last_released {
			if sequence <= last {
				return (
					None,
					GapInfo {
						kind: GapKind::ArrivedLate,
						size: last - sequence,
					},
				);
			}
		}

		self.buffer.insert(sequence, item);
		if self.buffer.len() <= self.capacity {
			return (
				None,
				GapInfo {
					kind: GapKind::FillingBuffer,
					size: 0,
				},
			);
		}

		// The buffer is over capacity; release the smallest sequence.
		let (sequence, item) = self.buffer.pop_first().expect("buffer is non-empty");

		// The very first release never counts as a gap.
		let size = match self.last_released {
			Some(last) => sequence - last - 1,
			None => 0,
		};
		self.last_released = Some(sequence);

		let kind = match size {
			0 => GapKind::NoGap,
			_ => GapKind::Gap,
		};

		(Some(item), GapInfo { kind, size })
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn insert(dejitter: &mut Dejitter<u64>, seq: u64) -> (Option<u64>, GapInfo) {
		dejitter.insert(seq, seq)
	}

	#[test]
	fn in_order() {
		let mut dejitter = Dejitter::new(3);

		for seq in 0..3 {
			let (released, gap) = insert(&mut dejitter, seq);
			assert_eq!(released, None);
			assert_eq!(gap.kind, GapKind::FillingBuffer);
		}
		assert_eq!(dejitter.len(), 3);

		let (released, gap) = insert(&mut dejitter, 3);
		assert_eq!(released, Some(0));
		assert_eq!(gap.kind, GapKind::NoGap);
		assert_eq!(dejitter.len(), 3);
	}

	#[test]
	fn out_of_order() {
		let mut dejitter = Dejitter::new(3);

		insert(&mut dejitter, 1);
		insert(&mut dejitter, 2);
		insert(&mut dejitter, 3);

		let (released, gap) = insert(&mut dejitter, 0);
		assert_eq!(released, Some(0));
		assert_eq!(gap.kind, GapKind::NoGap);

		let (released, gap) = insert(&mut dejitter, 4);
		assert_eq!(released, Some(1));
		assert_eq!(gap.kind, GapKind::NoGap);
	}

	#[test]
	fn gap_of_one() {
		let mut dejitter = Dejitter::new(3);

		insert(&mut dejitter, 2);
		insert(&mut dejitter, 0);
		insert(&mut dejitter, 3);

		let (released, gap) = insert(&mut dejitter, 4);
		assert_eq!(released, Some(0));
		assert_eq!(gap, GapInfo { kind: GapKind::NoGap, size: 0 });

		// Sequence 1 never arrived.
		let (released, gap) = insert(&mut dejitter, 5);
		assert_eq!(released, Some(2));
		assert_eq!(gap, GapInfo { kind: GapKind::Gap, size: 1 });
	}

	#[test]
	fn gap_of_two() {
		let mut dejitter = Dejitter::new(3);

		insert(&mut dejitter, 3);
		insert(&mut dejitter, 0);
		insert(&mut dejitter, 4);

		let (released, gap) = insert(&mut dejitter, 5);
		assert_eq!(released, Some(0));
		assert_eq!(gap.kind, GapKind::NoGap);

		// Sequences 1 and 2 never arrived.
		let (released, gap) = insert(&mut dejitter, 6);
		assert_eq!(released, Some(3));
		assert_eq!(gap, GapInfo { kind: GapKind::Gap, size: 2 });
	}

	#[test]
	fn arrived_late() {
		let mut dejitter = Dejitter::new(3);

		insert(&mut dejitter, 3);
		insert(&mut dejitter, 4);
		insert(&mut dejitter, 5);

		// The first release never counts as a gap, even starting at 3.
		let (released, gap) = insert(&mut dejitter, 6);
		assert_eq!(released, Some(3));
		assert_eq!(gap, GapInfo { kind: GapKind::NoGap, size: 0 });

		let (released, gap) = insert(&mut dejitter, 0);
		assert_eq!(released, None);
		assert_eq!(gap, GapInfo { kind: GapKind::ArrivedLate, size: 3 });
		assert_eq!(dejitter.len(), 3);
	}
}
