use thiserror::Error;


/// FingerprintError enumerates all possible errors returned by this library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {

	//Probably retrieving the image file
	#[error("{0}")]
	FileError(String),

	//The grid has no pixels to resample
	#[error("{0}")]
	ImageTooSmall(String),

	//The image library couldn't decode the file as an image
	#[error("{0}")]
	DecodeError(String),

	//Bad hash size or thread count, or fingerprints that can't be compared
	#[error("{0}")]
	ConfigError(String),
}

impl FingerprintError {

	//Per-image failures exclude the image from the run, anything else is fatal to the call
	pub fn is_recoverable( &self ) -> bool {
		return !matches!( self, FingerprintError::ConfigError(_) );
	}
}

pub type Result<T> = std::result::Result<T, FingerprintError>;


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_only_config_errors_are_fatal() {
		assert!( FingerprintError::FileError("a".to_string()).is_recoverable() );
		assert!( FingerprintError::DecodeError("b".to_string()).is_recoverable() );
		assert!( FingerprintError::ImageTooSmall("c".to_string()).is_recoverable() );
		assert!( !FingerprintError::ConfigError("d".to_string()).is_recoverable() );
	}

	#[test]
	fn test_message_is_passed_through() {
		let e = FingerprintError::ConfigError("Error: hash size must be at least 1".to_string());
		assert_eq!( e.to_string(), "Error: hash size must be at least 1" );
	}
}
