use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::{DirEntry, WalkDir};


//List of known image file extensions
const KNOWN_EXTENSIONS : [&str; 10] = [ "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "jfif", "heic" ];

//Only allows certain file extensions that may be images
//Unless the user has elected to allow all files to be tested
pub fn valid_file_extension( fpath: &Path, only_known_extensions: bool ) -> bool {
	if !only_known_extensions {
		return true;
	}

	match fpath.extension().and_then(OsStr::to_str) {
		Some(extension) => {
			let ext_lower = extension.to_lowercase();
			return KNOWN_EXTENSIONS.contains( &ext_lower.as_str() );
		},
		None => return false,
	}
}

//Traverse any directories and expand any glob patterns.
//Returns the unique absolute file paths found, sorted so runs are reproducible.
pub fn gather_file_list( path_list: &[String], only_known_extensions: bool ) -> Vec<PathBuf> {

	let mut dedup_file_list = BTreeSet::new();

	for file_or_dir in path_list {
		let fod_test = Path::new(file_or_dir);
		if fod_test.is_file() {
			if valid_file_extension( fod_test, only_known_extensions ) {
				insert_canonical( fod_test, &mut dedup_file_list );
			}
		}else if fod_test.is_dir() {
			//If the argument is a directory, then recursively traverse it
			walk_directory( fod_test, only_known_extensions, &mut dedup_file_list );
		}else if is_glob_pattern( file_or_dir ) {
			expand_glob( file_or_dir, only_known_extensions, &mut dedup_file_list );
		}else{
			warn!( "Failed to read: {}", file_or_dir );
		}
	}

	return dedup_file_list.into_iter().collect();
}

fn walk_directory( dir: &Path, only_known_extensions: bool, found: &mut BTreeSet<PathBuf> ) {
	let recurse_dir = WalkDir::new(dir).into_iter();
	for entry in recurse_dir.filter_entry(|e| !is_hidden(e)) {
		match entry {
			Ok(entry) => {
				let path = entry.path();
				if entry.file_type().is_file() && valid_file_extension( path, only_known_extensions ) {
					insert_canonical( path, found );
				}
			},
			Err(e) => warn!( "Failed to read directory entry: {}", e ),
		}
	}
}

fn expand_glob( pattern: &str, only_known_extensions: bool, found: &mut BTreeSet<PathBuf> ) {
	let paths = match glob::glob( pattern ) {
		Ok(paths) => paths,
		Err(e) => {
			warn!( "Invalid glob pattern {}: {}", pattern, e );
			return;
		}
	};

	for entry in paths {
		match entry {
			Ok(path) => {
				if path.is_file() && valid_file_extension( &path, only_known_extensions ) {
					insert_canonical( &path, found );
				}
			},
			Err(e) => warn!( "Failed to read: {}", e ),
		}
	}
}

//Two spellings of the same file (photos/a.jpg, photos/sub/../a.jpg, a symlink) must become one entry
fn insert_canonical( path: &Path, found: &mut BTreeSet<PathBuf> ) {
	match fs::canonicalize( path ) {
		Ok(canonical) => {
			found.insert( canonical );
		},
		Err(e) => {
			warn!( "Failed to resolve the absolute path of {}: {}", path.display(), e );
			found.insert( path.to_path_buf() );
		}
	}
}

fn is_glob_pattern( s: &str ) -> bool {
	return s.contains(['*', '?', '[']);
}

//Filter out invisible files and directories below the starting point
fn is_hidden( entry: &DirEntry ) -> bool {
	entry.depth() > 0 && entry.file_name()
		.to_str()
		.map(|s| s.starts_with("."))
		.unwrap_or(false)
}

//Read in the list of paths to inspect, one per line
pub fn read_path_list<R: BufRead>( reader: R ) -> Vec<String> {
	let mut path_list : Vec<String> = Vec::new();

	for line in reader.lines() {
		match line {
			Ok(line) => {
				let trimmed = line.trim_end_matches('\r');
				if !trimmed.is_empty() {
					path_list.push( trimmed.to_string() );
				}
			},
			Err(e) => {
				warn!( "Error reading path list: {}", e );
			}
		}
	}

	return path_list;
}
