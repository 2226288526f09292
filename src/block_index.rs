//! Bucketed pair search for large collections.
//!
//! The bit positions are split into `threshold + 1` contiguous blocks. Two
//! fingerprints within `threshold` bits of each other cannot differ in every
//! block, so they share the exact bits of at least one block and land in the
//! same bucket. Only bucket mates are compared, and every candidate is checked
//! with the full distance, so the result is exactly the exhaustive one.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::fingerprint::Fingerprint;
use crate::similarity::{scan_rows, IndexPair};


/// Contiguous bit ranges, sizes differing by at most one.
pub fn block_ranges( bit_len: usize, blocks: usize ) -> Vec<Range<usize>> {
	let base = bit_len / blocks;
	let extra = bit_len % blocks;
	let mut ranges = Vec::with_capacity( blocks );
	let mut start = 0;
	for b in 0..blocks {
		let len = base + if b < extra { 1 } else { 0 };
		ranges.push( start..start + len );
		start += len;
	}
	return ranges;
}

/// Pairs within `threshold` in enumeration order. Fingerprints must all share one width.
pub(crate) fn find_pairs( fingerprints: &[Fingerprint], threshold: u32 ) -> Vec<IndexPair> {
	let bit_len = match fingerprints.first() {
		Some(fp) => fp.bit_len(),
		None => return Vec::new(),
	};

	let blocks = (threshold as usize).saturating_add(1);
	if blocks > bit_len {
		//Some block would be empty and match everything
		return scan_rows( fingerprints, 0..fingerprints.len(), threshold );
	}

	let mut candidates : HashSet<(usize, usize)> = HashSet::new();
	for range in block_ranges( bit_len, blocks ) {
		let mut buckets : HashMap<Vec<u64>, Vec<usize>> = HashMap::new();
		for (i, fp) in fingerprints.iter().enumerate() {
			buckets.entry( fp.bit_range( range.clone() ) ).or_default().push( i );
		}
		for members in buckets.values().filter(|m| m.len() > 1) {
			for (n, &i) in members.iter().enumerate() {
				for &j in &members[n + 1..] {
					candidates.insert( (i, j) );
				}
			}
		}
	}

	let mut pairs : Vec<IndexPair> = candidates.into_iter()
		.filter_map(|(i, j)| {
			let distance = fingerprints[i].hamming_unchecked( &fingerprints[j] );
			if distance <= threshold { Some(IndexPair { first: i, second: j, distance }) } else { None }
		})
		.collect();
	pairs.sort_by_key(|p| (p.first, p.second));

	return pairs;
}
