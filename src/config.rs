use clap::ValueEnum;
use image::imageops::FilterType;

use crate::image_error::{FingerprintError, Result};


/// Resampling filter used to bring every image down to the DCT input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResizeFilter {
	Nearest,
	Triangle,
	CatmullRom,
	Gaussian,
	Lanczos3,
}

impl ResizeFilter {
	pub fn filter_type( self ) -> FilterType {
		match self {
			ResizeFilter::Nearest => FilterType::Nearest,
			ResizeFilter::Triangle => FilterType::Triangle,
			ResizeFilter::CatmullRom => FilterType::CatmullRom,
			ResizeFilter::Gaussian => FilterType::Gaussian,
			ResizeFilter::Lanczos3 => FilterType::Lanczos3,
		}
	}
}

/// Settings that change the bits of a fingerprint. Fingerprints are only
/// comparable when they were produced with the same hash size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
	pub hash_size : u32,
	pub filter : ResizeFilter,
}

impl HashConfig {
	pub fn new( hash_size: u32 ) -> HashConfig {
		return HashConfig { hash_size, ..HashConfig::default() };
	}

	//Side of the square the image is resampled to before the transform
	pub fn side( &self ) -> Result<u32> {
		self.validate()?;
		return self.hash_size.checked_mul(4).ok_or_else(|| too_large( self.hash_size ));
	}

	//Number of bits in a fingerprint
	pub fn bit_len( &self ) -> Result<usize> {
		self.validate()?;
		let size = self.hash_size as usize;
		return size.checked_mul(size).ok_or_else(|| too_large( self.hash_size ));
	}

	pub fn validate( &self ) -> Result<()> {
		if self.hash_size < 1 {
			return Err(FingerprintError::ConfigError("Error: hash size must be at least 1".to_string()));
		}
		if self.hash_size > ConfigOptions::MAX_HASH_SIZE {
			return Err(too_large( self.hash_size ));
		}
		return Ok(());
	}
}

impl Default for HashConfig {
	fn default() -> Self {
		return HashConfig { hash_size: ConfigOptions::DEFAULT_HASH_SIZE, filter: ResizeFilter::Lanczos3 };
	}
}

fn too_large( hash_size: u32 ) -> FingerprintError {
	return FingerprintError::ConfigError(format!("Error: hash size {} is larger than the maximum of {}", hash_size, ConfigOptions::MAX_HASH_SIZE));
}

#[derive(Debug, Clone)]
pub struct ConfigOptions {
	pub hash : HashConfig,
	pub threshold : u32,
	pub num_threads : u32,
	pub alg_flip_threshold : u64,
	pub force_exhaustive : bool,
	pub only_known_file_extensions : bool,
	pub sort_by_distance : bool,
	pub show_progress : bool,
}

impl ConfigOptions {
	pub const DEFAULT_HASH_SIZE : u32 = 8;			//8x8 block, 64 bit fingerprints
	pub const MAX_HASH_SIZE : u32 = 64;				//4096 bit fingerprints from a 256x256 transform
	pub const DEFAULT_THRESHOLD : u32 = 5;			//Max number of differing bits for two images to be reported as similar
	pub const DEFAULT_NUM_THREADS : u32 = 4;
	pub const DEFAULT_ALG_FLIP_THRESHOLD : u64 = 20000;	//Number of images at which we flip to the block index scan

	pub fn validate( &self ) -> Result<()> {
		self.hash.validate()?;
		if self.num_threads < 1 {
			return Err(FingerprintError::ConfigError("Number of threads must be greater than 0".to_string()));
		}
		return Ok(());
	}
}

impl Default for ConfigOptions {
	fn default() -> Self {
		return ConfigOptions {
			hash: HashConfig::default(),
			threshold: ConfigOptions::DEFAULT_THRESHOLD,
			num_threads: ConfigOptions::DEFAULT_NUM_THREADS,
			alg_flip_threshold: ConfigOptions::DEFAULT_ALG_FLIP_THRESHOLD,
			force_exhaustive: false,
			only_known_file_extensions: true,
			sort_by_distance: false,
			show_progress: true,
		};
	}
}
