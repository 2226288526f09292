use std::fmt;

use crate::image_error::{FingerprintError, Result};


/// A perceptual hash: `hash_size * hash_size` bits flattened row-major from
/// the low frequency DCT block. Bit `i` lives in word `i / 64` at position `i % 64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
	hash_size : u32,
	words : Vec<u64>,
}

impl Fingerprint {

	/// Build from exactly `hash_size²` bits in row-major order.
	pub fn from_bits<I>( hash_size: u32, bits: I ) -> Result<Fingerprint>
	where
		I: IntoIterator<Item = bool>,
	{
		let bit_len = (hash_size as usize) * (hash_size as usize);
		let mut words = vec![0u64; word_count(bit_len)];
		let mut seen = 0usize;

		for bit in bits {
			if seen >= bit_len {
				return Err(FingerprintError::ConfigError(format!("Error: more than {} bits supplied for hash size {}", bit_len, hash_size)));
			}
			if bit {
				words[ seen / 64 ] |= 1u64 << (seen % 64);
			}
			seen += 1;
		}

		if seen != bit_len || hash_size < 1 {
			return Err(FingerprintError::ConfigError(format!("Error: {} bits supplied but hash size {} needs {}", seen, hash_size, bit_len)));
		}

		return Ok(Fingerprint { hash_size, words });
	}

	pub fn hash_size( &self ) -> u32 {
		return self.hash_size;
	}

	pub fn bit_len( &self ) -> usize {
		return (self.hash_size as usize) * (self.hash_size as usize);
	}

	pub fn bit( &self, index: usize ) -> bool {
		return (self.words[ index / 64 ] >> (index % 64)) & 1 == 1;
	}

	pub fn count_ones( &self ) -> u32 {
		return self.words.iter().map(|w| w.count_ones()).sum();
	}

	pub fn is_comparable( &self, other: &Fingerprint ) -> bool {
		return self.hash_size == other.hash_size;
	}

	/// Number of bit positions at which the two fingerprints differ.
	pub fn hamming( &self, other: &Fingerprint ) -> Result<u32> {
		if !self.is_comparable( other ) {
			return Err(FingerprintError::ConfigError(format!("Error: cannot compare a {} bit fingerprint with a {} bit fingerprint", self.bit_len(), other.bit_len())));
		}
		return Ok(self.hamming_unchecked( other ));
	}

	//Callers must have checked the widths match
	pub(crate) fn hamming_unchecked( &self, other: &Fingerprint ) -> u32 {
		return self.words.iter()
			.zip(other.words.iter())
			.map(|(a, b)| (a ^ b).count_ones())
			.sum();
	}

	/// The bits in `range`, packed into words starting at bit 0. Used as a bucket key.
	pub(crate) fn bit_range( &self, range: std::ops::Range<usize> ) -> Vec<u64> {
		let mut key = vec![0u64; word_count(range.len())];
		for (n, index) in range.enumerate() {
			if self.bit( index ) {
				key[ n / 64 ] |= 1u64 << (n % 64);
			}
		}
		return key;
	}

	/// Parse the hex form produced by `Display`.
	pub fn from_hex( hex: &str, hash_size: u32 ) -> Result<Fingerprint> {
		if hash_size < 1 {
			return Err(FingerprintError::ConfigError("Error: hash size must be at least 1".to_string()));
		}
		let bit_len = (hash_size as usize) * (hash_size as usize);
		let nibbles = (bit_len + 3) / 4;
		if hex.len() != nibbles {
			return Err(FingerprintError::ConfigError(format!("Error: fingerprint \"{}\" should be {} hex digits for hash size {}", hex, nibbles, hash_size)));
		}

		let mut padded_bits = Vec::with_capacity( nibbles * 4 );
		for c in hex.chars() {
			let value = c.to_digit(16).ok_or_else(|| FingerprintError::ConfigError(format!("Error: \"{}\" is not a hex digit", c)))?;
			for shift in (0..4).rev() {
				padded_bits.push( (value >> shift) & 1 == 1 );
			}
		}

		let pad = nibbles * 4 - bit_len;
		if padded_bits[..pad].iter().any(|b| *b) {
			return Err(FingerprintError::ConfigError(format!("Error: fingerprint \"{}\" has bits set in its padding", hex)));
		}

		return Fingerprint::from_bits( hash_size, padded_bits.into_iter().skip(pad) );
	}
}

/// Lowercase hex with bit 0 as the most significant bit, left padded with
/// zero bits to a whole number of hex digits.
impl fmt::Display for Fingerprint {
	fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
		let bit_len = self.bit_len();
		let nibbles = (bit_len + 3) / 4;
		let pad = nibbles * 4 - bit_len;

		for n in 0..nibbles {
			let mut value = 0u32;
			for p in (n * 4)..(n * 4 + 4) {
				value <<= 1;
				if p >= pad && self.bit( p - pad ) {
					value |= 1;
				}
			}
			write!( f, "{:x}", value )?;
		}
		return Ok(());
	}
}

fn word_count( bits: usize ) -> usize {
	return (bits + 63) / 64;
}
