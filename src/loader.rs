use std::path::{Path, PathBuf};

use image::io::Reader;
use image::GrayImage;

use crate::image_error::{FingerprintError, Result};


//Open an image from the specific path
//Tries to guess the format from the content rather than trusting the extension
pub fn load_image_from_file( image_path: &Path ) -> Result<GrayImage> {

	let img = match Reader::open( image_path ) {
		Ok(image) => image,
		Err(_) => {
			return Err(FingerprintError::FileError(format!("Error: Failed to read image file: {}", image_path.display())));
		},
	};

	let format_guessed = match img.with_guessed_format() {
		Ok( format_guessed ) => format_guessed,
		Err(_) => {
			return Err(FingerprintError::DecodeError(format!("Error: Failed to identify image file format {}", image_path.display())));
		}
	};

	let decoded_img = match format_guessed.decode() {
		Ok( decoded_img ) => decoded_img,
		Err(_) => {
			return Err(FingerprintError::DecodeError(format!("Error: Failed to correctly decode image: {}", image_path.display())));
		}
	};

	return Ok(decoded_img.to_luma8());
}

/// `ImageLoader` shaped wrapper for path identifiers.
pub fn load_path( image_path: &PathBuf ) -> Result<GrayImage> {
	return load_image_from_file( image_path );
}
