use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Range;
use std::sync::mpsc::channel;
use std::sync::Arc;

use serde::Serialize;
use threadpool::ThreadPool;
use tracing::debug;

use crate::block_index;
use crate::config::ConfigOptions;
use crate::fingerprint::Fingerprint;
use crate::image_error::{FingerprintError, Result};


/// Two images, by identifier, whose fingerprints differ in `distance` bits.
/// `first` always comes before `second` in the input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityPair<K> {
	pub first : K,
	pub second : K,
	pub distance : u32,
}

/// Pairs in enumeration order: by the position of `first`, then of `second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityReport<K> {
	pairs : Vec<SimilarityPair<K>>,
}

impl<K> SimilarityReport<K> {

	pub fn pairs( &self ) -> &[SimilarityPair<K>] {
		return &self.pairs;
	}

	pub fn len( &self ) -> usize {
		return self.pairs.len();
	}

	pub fn is_empty( &self ) -> bool {
		return self.pairs.is_empty();
	}

	pub fn iter( &self ) -> std::slice::Iter<'_, SimilarityPair<K>> {
		return self.pairs.iter();
	}

	//Stable, so equal distances keep their enumeration order
	pub fn sort_by_distance( &mut self ) {
		self.pairs.sort_by_key(|p| p.distance);
	}

	pub fn into_pairs( self ) -> Vec<SimilarityPair<K>> {
		return self.pairs;
	}
}

impl<K: PartialEq> SimilarityReport<K> {
	//Order of a and b doesn't matter
	pub fn distance_between( &self, a: &K, b: &K ) -> Option<u32> {
		return self.pairs.iter()
			.find(|p| (p.first == *a && p.second == *b) || (p.first == *b && p.second == *a))
			.map(|p| p.distance);
	}
}

impl<K> IntoIterator for SimilarityReport<K> {
	type Item = SimilarityPair<K>;
	type IntoIter = std::vec::IntoIter<SimilarityPair<K>>;

	fn into_iter( self ) -> Self::IntoIter {
		return self.pairs.into_iter();
	}
}

/// How the pair space is searched. Both give identical reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
	Exhaustive,
	BlockIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexPair {
	pub first : usize,
	pub second : usize,
	pub distance : u32,
}

/// Every pair within `threshold` bits, compared all against all.
pub fn find_similar<K>( fingerprints: &[(K, Fingerprint)], threshold: u32 ) -> Result<SimilarityReport<K>>
where
	K: Clone + Eq + Hash + Debug,
{
	return find_similar_using( fingerprints, threshold, ScanStrategy::Exhaustive );
}

pub fn find_similar_using<K>( fingerprints: &[(K, Fingerprint)], threshold: u32, strategy: ScanStrategy ) -> Result<SimilarityReport<K>>
where
	K: Clone + Eq + Hash + Debug,
{
	validate_fingerprint_set( fingerprints )?;
	let fps : Vec<Fingerprint> = fingerprints.iter().map(|(_, fp)| fp.clone()).collect();

	let pairs = match strategy {
		ScanStrategy::Exhaustive => scan_rows( &fps, 0..fps.len(), threshold ),
		ScanStrategy::BlockIndex => block_index::find_pairs( &fps, threshold ),
	};

	return Ok(build_report( fingerprints, pairs ));
}

/// The exhaustive scan split over `num_threads` workers. Same report as `find_similar`.
pub fn find_similar_parallel<K>( fingerprints: &[(K, Fingerprint)], threshold: u32, num_threads: u32 ) -> Result<SimilarityReport<K>>
where
	K: Clone + Eq + Hash + Debug,
{
	if num_threads < 1 {
		return Err(FingerprintError::ConfigError("Number of threads must be greater than 0".to_string()));
	}
	validate_fingerprint_set( fingerprints )?;

	let fps : Vec<Fingerprint> = fingerprints.iter().map(|(_, fp)| fp.clone()).collect();
	let pairs = scan_parallel( fps, threshold, num_threads as usize );

	return Ok(build_report( fingerprints, pairs ));
}

/// Pick the scan from the configuration: all against all up to `alg_flip_threshold`
/// images, the block index beyond it.
pub fn find_similar_with<K>( fingerprints: &[(K, Fingerprint)], config: &ConfigOptions ) -> Result<SimilarityReport<K>>
where
	K: Clone + Eq + Hash + Debug,
{
	config.validate()?;

	let mut report = if (fingerprints.len() as u64) <= config.alg_flip_threshold || config.force_exhaustive {
		debug!( images = fingerprints.len(), threads = config.num_threads, "exhaustive pair scan" );
		find_similar_parallel( fingerprints, config.threshold, config.num_threads )?
	}else{
		debug!( images = fingerprints.len(), "block index pair scan" );
		find_similar_using( fingerprints, config.threshold, ScanStrategy::BlockIndex )?
	};

	if config.sort_by_distance {
		report.sort_by_distance();
	}

	return Ok(report);
}

//Every fingerprint must share the first one's width and every identifier must be unique
fn validate_fingerprint_set<K>( fingerprints: &[(K, Fingerprint)] ) -> Result<()>
where
	K: Eq + Hash + Debug,
{
	let Some((_, reference)) = fingerprints.first() else {
		return Ok(());
	};

	let mut seen = HashSet::with_capacity( fingerprints.len() );
	for (id, fp) in fingerprints {
		if !fp.is_comparable( reference ) {
			return Err(FingerprintError::ConfigError(format!("Error: fingerprint for {:?} has {} bits, expected {}", id, fp.bit_len(), reference.bit_len())));
		}
		if !seen.insert( id ) {
			return Err(FingerprintError::ConfigError(format!("Error: {:?} appears more than once", id)));
		}
	}
	return Ok(());
}

fn build_report<K: Clone>( fingerprints: &[(K, Fingerprint)], pairs: Vec<IndexPair> ) -> SimilarityReport<K> {
	let pairs = pairs.into_iter()
		.map(|p| SimilarityPair {
			first: fingerprints[p.first].0.clone(),
			second: fingerprints[p.second].0.clone(),
			distance: p.distance,
		})
		.collect();
	return SimilarityReport { pairs };
}

//All against all for the outer indices in `rows`, each compared with every later index
pub(crate) fn scan_rows( fps: &[Fingerprint], rows: Range<usize>, threshold: u32 ) -> Vec<IndexPair> {
	let mut pairs = Vec::new();
	for i in rows {
		for j in (i + 1)..fps.len() {
			let distance = fps[i].hamming_unchecked( &fps[j] );
			if distance <= threshold {
				pairs.push( IndexPair { first: i, second: j, distance } );
			}
		}
	}
	return pairs;
}

/// Split outer indices `0..n` into at most `parts` contiguous ranges holding
/// roughly the same number of pairs. Row `i` holds `n - 1 - i` pairs.
pub fn partition_rows( n: usize, parts: usize ) -> Vec<Range<usize>> {
	if n == 0 {
		return Vec::new();
	}

	let parts = parts.max(1);
	let total = n * (n - 1) / 2;
	let target = ((total + parts - 1) / parts).max(1);

	let mut ranges = Vec::with_capacity( parts );
	let mut start = 0;
	let mut in_range = 0;
	for i in 0..n {
		in_range += n - 1 - i;
		if in_range >= target && ranges.len() + 1 < parts {
			ranges.push( start..i + 1 );
			start = i + 1;
			in_range = 0;
		}
	}
	if start < n {
		ranges.push( start..n );
	}

	return ranges;
}

fn scan_parallel( fps: Vec<Fingerprint>, threshold: u32, num_threads: usize ) -> Vec<IndexPair> {
	let partitions = partition_rows( fps.len(), num_threads );
	if partitions.len() <= 1 {
		return scan_rows( &fps, 0..fps.len(), threshold );
	}

	let fps = Arc::new( fps );
	let pool = ThreadPool::new( num_threads.min( partitions.len() ) );

	let (tx, rx) = channel();
	for (part, rows) in partitions.iter().cloned().enumerate() {
		let tx = tx.clone();
		let fps = Arc::clone( &fps );
		pool.execute(move|| {
			let _ = tx.send( (part, scan_rows( &fps, rows, threshold )) );
		});
	}
	drop(tx);

	//Concatenate in partition order
	let mut results : Vec<Vec<IndexPair>> = vec![Vec::new(); partitions.len()];
	for (part, pairs) in rx.into_iter() {
		results[part] = pairs;
	}
	return results.into_iter().flatten().collect();
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::imagehash::compute_fingerprint;
	use crate::test_images;
	use image::imageops::{self, FilterType};

	fn fp( bits: u64 ) -> Fingerprint {
		Fingerprint::from_bits( 8, (0..64).map(|i| (bits >> i) & 1 == 1) ).unwrap()
	}

	fn spread( n: usize ) -> Vec<(usize, Fingerprint)> {
		let mut state = 0x9E37_79B9_7F4A_7C15u64;
		(0..n).map(|i| {
			state ^= state << 13;
			state ^= state >> 7;
			state ^= state << 17;
			//Every third entry is a near copy of the previous one
			let bits = if i % 3 == 2 { state ^ 0b101 } else { state };
			(i, fp( bits ))
		}).collect()
	}

	#[test]
	fn test_empty_and_singleton() {
		let empty : Vec<(String, Fingerprint)> = Vec::new();
		assert!( find_similar( &empty, 5 ).unwrap().is_empty() );
		assert!( find_similar( &empty, 0 ).unwrap().is_empty() );

		let single = vec![ ("a".to_string(), fp(42)) ];
		assert!( find_similar( &single, 64 ).unwrap().is_empty() );
	}

	#[test]
	fn test_pairs_within_threshold_in_order() {
		let fps = vec![ ("a", fp(0b0000)), ("b", fp(0b1111)), ("c", fp(0b0001)), ("d", fp(0b0011)) ];
		let report = find_similar( &fps, 1 ).unwrap();
		let found : Vec<_> = report.iter().map(|p| (p.first, p.second, p.distance)).collect();
		assert_eq!( found, vec![ ("a", "c", 1), ("c", "d", 1) ] );
	}

	#[test]
	fn test_no_self_or_duplicate_pairs() {
		let fps : Vec<(usize, Fingerprint)> = (0..12).map(|i| (i, fp(7))).collect();
		let report = find_similar( &fps, 0 ).unwrap();
		assert_eq!( report.len(), 12 * 11 / 2 );

		let mut seen = HashSet::new();
		for p in report.iter() {
			assert_ne!( p.first, p.second );
			assert!( p.first < p.second, "first precedes second in input order" );
			assert!( seen.insert( (p.first, p.second) ) );
		}
	}

	#[test]
	fn test_threshold_monotonicity() {
		let fps = spread( 40 );
		let mut previous : Option<SimilarityReport<usize>> = None;
		for threshold in 0..=64 {
			let report = find_similar( &fps, threshold ).unwrap();
			assert!( report.iter().all(|p| p.distance <= threshold) );
			if let Some(prev) = &previous {
				for p in prev.iter() {
					assert_eq!( report.distance_between( &p.first, &p.second ), Some(p.distance) );
				}
				assert!( report.len() >= prev.len() );
			}
			previous = Some(report);
		}
		assert_eq!( previous.unwrap().len(), 40 * 39 / 2 );
	}

	#[test]
	fn test_distance_is_symmetric_in_report() {
		let fps = spread( 10 );
		let forward = find_similar( &fps, 64 ).unwrap();
		let reversed : Vec<_> = fps.iter().rev().cloned().collect();
		let backward = find_similar( &reversed, 64 ).unwrap();
		for p in forward.iter() {
			assert_eq!( backward.distance_between( &p.second, &p.first ), Some(p.distance) );
		}
	}

	#[test]
	fn test_mismatched_width_names_the_offender() {
		let wide = Fingerprint::from_bits( 16, vec![false; 256] ).unwrap();
		let fps = vec![ ("a", fp(1)), ("b", fp(2)), ("odd_one", wide) ];
		match find_similar( &fps, 5 ) {
			Err(FingerprintError::ConfigError(msg)) => assert!( msg.contains("odd_one") ),
			other => panic!( "expected a config error, got {:?}", other ),
		}
	}

	#[test]
	fn test_duplicate_identifier_rejected() {
		let fps = vec![ ("a", fp(1)), ("a", fp(2)) ];
		assert!( matches!( find_similar( &fps, 5 ), Err(FingerprintError::ConfigError(_)) ) );
	}

	#[test]
	fn test_parallel_matches_sequential() {
		let fps = spread( 97 );
		let sequential = find_similar( &fps, 6 ).unwrap();
		for threads in [1, 2, 3, 8, 200] {
			let parallel = find_similar_parallel( &fps, 6, threads ).unwrap();
			assert_eq!( parallel, sequential, "{} threads", threads );
		}
		assert!( find_similar_parallel( &fps, 6, 0 ).is_err() );
	}

	#[test]
	fn test_block_index_matches_exhaustive() {
		let fps = spread( 150 );
		for threshold in [0, 3, 5, 12] {
			let exhaustive = find_similar( &fps, threshold ).unwrap();
			let indexed = find_similar_using( &fps, threshold, ScanStrategy::BlockIndex ).unwrap();
			assert_eq!( indexed, exhaustive );
		}
	}

	#[test]
	fn test_config_flips_to_block_index_with_same_result() {
		let fps = spread( 60 );
		let exhaustive = find_similar( &fps, 5 ).unwrap();
		let config = ConfigOptions { alg_flip_threshold: 10, ..ConfigOptions::default() };
		assert_eq!( find_similar_with( &fps, &config ).unwrap(), exhaustive );
	}

	#[test]
	fn test_sort_by_distance_is_stable() {
		let fps = vec![ ("a", fp(0b000)), ("b", fp(0b011)), ("c", fp(0b001)), ("d", fp(0b000)) ];
		let config = ConfigOptions { sort_by_distance: true, ..ConfigOptions::default() };
		let report = find_similar_with( &fps, &config ).unwrap();
		let distances : Vec<u32> = report.iter().map(|p| p.distance).collect();
		let mut sorted = distances.clone();
		sorted.sort();
		assert_eq!( distances, sorted );
		//The identical pair leads
		assert_eq!( (report.pairs()[0].first, report.pairs()[0].second), ("a", "d") );
	}

	#[test]
	fn test_partition_rows() {
		assert!( partition_rows( 0, 4 ).is_empty() );
		assert_eq!( partition_rows( 1, 4 ), vec![0..1] );

		let ranges = partition_rows( 100, 4 );
		assert_eq!( ranges.len(), 4 );
		assert_eq!( ranges[0].start, 0 );
		assert_eq!( ranges[3].end, 100 );
		for w in ranges.windows(2) {
			assert_eq!( w[0].end, w[1].start );
		}
		//Early rows hold more pairs so the first partition is the narrowest
		assert!( ranges[0].len() < ranges[3].len() );
	}

	#[test]
	fn test_end_to_end_three_photos() {
		let a = test_images::photo( 400, 300, 101 );
		let b = test_images::reencode_jpeg( &imageops::resize( &a, 300, 225, FilterType::Triangle ), 35 );
		let a = test_images::reencode_jpeg( &a, 95 );
		let c = test_images::negative( &a );

		let fps = vec![
			("A", compute_fingerprint( &a, 8 ).unwrap()),
			("B", compute_fingerprint( &b, 8 ).unwrap()),
			("C", compute_fingerprint( &c, 8 ).unwrap()),
		];
		assert!( fps[0].1.hamming( &fps[2].1 ).unwrap() > 20 );
		assert!( fps[1].1.hamming( &fps[2].1 ).unwrap() > 20 );

		let report = find_similar( &fps, 5 ).unwrap();
		assert_eq!( report.len(), 1 );
		let pair = &report.pairs()[0];
		assert_eq!( (pair.first, pair.second), ("A", "B") );
		assert!( pair.distance <= 5 );
	}
}
