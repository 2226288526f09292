use image::GrayImage;
use image::imageops;

use crate::config::HashConfig;
use crate::dct::{crop_low_frequencies, DctPlan};
use crate::fingerprint::Fingerprint;
use crate::image_error::{FingerprintError, Result};


/// An identifier paired with its decoded grayscale pixels.
pub struct ImageHandle<K> {
	pub id : K,
	pub pixels : GrayImage,
}

impl<K> ImageHandle<K> {
	pub fn new( id: K, pixels: GrayImage ) -> ImageHandle<K> {
		return ImageHandle { id, pixels };
	}

	pub fn fingerprint( &self, hash: &HashConfig ) -> Result<Fingerprint> {
		return compute_fingerprint_with( &self.pixels, hash );
	}
}

/// Perceptual hash of `pixels` with the default resampling filter.
pub fn compute_fingerprint( pixels: &GrayImage, hash_size: u32 ) -> Result<Fingerprint> {
	return compute_fingerprint_with( pixels, &HashConfig::new( hash_size ) );
}

/**
 * DCT perceptual hash
 * 	1st) Resample to a (hash_size * 4) square
 *  2nd) 2-D DCT-II of the resampled grid
 *  3rd) Keep the top-left hash_size x hash_size block of coefficients
 *  4th) One bit per coefficient: set when strictly above the median of the block's AC terms
 */
pub fn compute_fingerprint_with( pixels: &GrayImage, hash: &HashConfig ) -> Result<Fingerprint> {
	let plan = DctPlan::new( hash.side()? as usize );
	return compute_fingerprint_planned( pixels, hash, &plan );
}

//Same as compute_fingerprint_with, reusing a cosine table built for `hash.side()`
pub(crate) fn compute_fingerprint_planned( pixels: &GrayImage, hash: &HashConfig, plan: &DctPlan ) -> Result<Fingerprint> {

	let side = hash.side()?;
	let size = hash.hash_size as usize;
	if plan.size() != side as usize {
		return Err(FingerprintError::ConfigError(format!("Error: transform built for {} samples, hash size {} needs {}", plan.size(), hash.hash_size, side)));
	}

	let (width, height) = pixels.dimensions();
	if width == 0 || height == 0 {
		return Err(FingerprintError::ImageTooSmall(format!("Warning: Image has no pixels ({}x{})", width, height)));
	}

	let scaled = imageops::resize( pixels, side, side, hash.filter.filter_type() );
	if scaled.dimensions() != (side, side) {
		return Err(FingerprintError::DecodeError(format!("Error: Failed to resize image correctly to {}x{}", side, side)));
	}

	let grid : Vec<f64> = scaled.pixels().map(|p| p.0[0] as f64).collect();
	let coefficients = plan.transform_2d( &grid );
	let block = crop_low_frequencies( &coefficients, side as usize, size );

	let median = block_median( &block );

	return Fingerprint::from_bits( hash.hash_size, block.iter().map(|c| *c > median) );
}

//Median of the AC terms (everything but block[0]). An even count averages the two middle values.
//A 1x1 block has no AC terms so its DC term stands in.
fn block_median( block: &[f64] ) -> f64 {
	if block.len() < 2 {
		return block.first().copied().unwrap_or(0.0);
	}

	let mut ac = block[1..].to_vec();
	ac.sort_by(|a, b| a.total_cmp(b));

	let mid = ac.len() / 2;
	if ac.len() % 2 == 0 {
		return (ac[mid - 1] + ac[mid]) / 2.0;
	}
	return ac[mid];
}
