//! Near-duplicate photo detection.
//!
//! Every image is reduced to a DCT perceptual hash ([`compute_fingerprint`]),
//! then every pair of images whose hashes differ in at most `threshold` bits
//! is reported ([`find_similar`]).

pub mod batch;
pub mod block_index;
pub mod config;
pub mod dct;
pub mod file_list;
pub mod fingerprint;
pub mod image_error;
pub mod imagehash;
pub mod loader;
pub mod similarity;

#[cfg(test)]
mod test_images;

pub use batch::{fingerprint_handles, fingerprint_images, FingerprintRun, ImageLoader};
pub use config::{ConfigOptions, HashConfig, ResizeFilter};
pub use fingerprint::Fingerprint;
pub use image_error::FingerprintError;
pub use imagehash::{compute_fingerprint, compute_fingerprint_with, ImageHandle};
pub use similarity::{find_similar, find_similar_parallel, find_similar_using, find_similar_with, ScanStrategy, SimilarityPair, SimilarityReport};
