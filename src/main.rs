use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use phashdupe::file_list::{gather_file_list, read_path_list};
use phashdupe::loader::{load_image_from_file, load_path};
use phashdupe::{compute_fingerprint_with, find_similar_with, fingerprint_images, ConfigOptions, FingerprintRun, HashConfig, ResizeFilter, SimilarityPair, SimilarityReport};


#[derive(Parser, Debug)]
#[command(name = "phashdupe", author = "InexplicableMagic https://github.com/InexplicableMagic", version, about = "Locates near-duplicate photos by comparing perceptual hashes")]
struct Cli {
	/// Max number of differing fingerprint bits for two images to be reported as similar.
	#[arg(long, default_value_t = ConfigOptions::DEFAULT_THRESHOLD)]
	threshold: u32,

	/// Side of the DCT block kept for the hash. The fingerprint has hash-size squared bits.
	#[arg(long, default_value_t = ConfigOptions::DEFAULT_HASH_SIZE, value_parser = clap::value_parser!(u32).range(1..=ConfigOptions::MAX_HASH_SIZE as i64))]
	hash_size: u32,

	/// Number of CPU threads to use. Higher number improves performance if more CPU threads are available.
	#[arg(short = 't', long = "threads", default_value_t = ConfigOptions::DEFAULT_NUM_THREADS, value_parser = clap::value_parser!(u32).range(1..))]
	num_threads: u32,

	/// Resampling filter used before the DCT.
	#[arg(long, value_enum, default_value_t = ResizeFilter::Lanczos3)]
	filter: ResizeFilter,

	/// Tests every file to see if it might be an image regardless of file extension.
	#[arg(short = 'y', long)]
	any_file: bool,

	/// List the closest pairs first instead of in discovery order.
	#[arg(long)]
	sort_by_distance: bool,

	/// Always compare every image against every other image, even for very large collections.
	#[arg(long)]
	force_exhaustive: bool,

	/// Print the pairs, fingerprints and failures as JSON.
	#[arg(long, conflicts_with = "debug")]
	json: bool,

	/// Don't show the progress bar.
	#[arg(short, long)]
	quiet: bool,

	/// Log a summary of each stage.
	#[arg(short, long)]
	verbose: bool,

	/// Debug mode. Fingerprint exactly two files and explain whether they are similar.
	#[arg(short = 'g', long)]
	debug: bool,

	/// Files, directories or glob patterns. Paths are read from stdin when none are given.
	dir_or_file: Vec<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
	pairs: &'a [SimilarityPair<PathBuf>],
	fingerprints: Vec<JsonFingerprint<'a>>,
	failures: Vec<JsonFailure<'a>>,
}

#[derive(Serialize)]
struct JsonFingerprint<'a> {
	path: &'a Path,
	fingerprint: String,
}

#[derive(Serialize)]
struct JsonFailure<'a> {
	path: &'a Path,
	error: String,
}


fn main() -> ExitCode {

	//Process command line arguments
	let cli = Cli::parse();
	init_logging( cli.verbose );

	//Set the configuration options based on the command line
	let config = set_config_options( &cli );

	let result = if cli.debug { debug_mode( &cli, &config ) } else { run( &cli, &config ) };
	match result {
		Ok(code) => code,
		Err(e) => {
			eprintln!("{}", e);
			ExitCode::FAILURE
		}
	}
}

fn init_logging( verbose: bool ) {
	let default_level = if verbose { "info" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new( default_level ));
	tracing_subscriber::fmt()
		.with_env_filter( filter )
		.with_writer( io::stderr )
		.with_target( false )
		.init();
}

fn set_config_options( cli: &Cli ) -> ConfigOptions {
	return ConfigOptions {
		hash: HashConfig { hash_size: cli.hash_size, filter: cli.filter },
		threshold: cli.threshold,
		num_threads: cli.num_threads,
		force_exhaustive: cli.force_exhaustive,
		only_known_file_extensions: !cli.any_file,
		sort_by_distance: cli.sort_by_distance,
		show_progress: !cli.quiet && !cli.json,
		..ConfigOptions::default()
	};
}

fn run( cli: &Cli, config: &ConfigOptions ) -> Result<ExitCode, Box<dyn Error>> {

	//Gather the list of files to inspect
	let inputs = if cli.dir_or_file.is_empty() { read_path_list( io::stdin().lock() ) } else { cli.dir_or_file.clone() };
	let files = gather_file_list( &inputs, config.only_known_file_extensions );
	if files.is_empty() {
		eprintln!("Didn't find any image files to test");
		return Ok(ExitCode::FAILURE);
	}

	//Calculate a fingerprint for each image, then compare them
	let run = fingerprint_images( files, load_path, config )?;
	let report = find_similar_with( &run.fingerprints, config )?;

	info!( images = run.total(), fingerprinted = run.fingerprints.len(), failed = run.failures.len(), pairs = report.len(), "comparison finished" );

	if cli.json {
		output_json( &report, &run )?;
	}else{
		output_results( &report );
	}

	return Ok(ExitCode::SUCCESS);
}

//Print the similar pairs, closest or first found first
fn output_results( report: &SimilarityReport<PathBuf> ) {
	if report.is_empty() {
		println!("No similar images found.");
		return;
	}

	println!("Found {} similar pair(s):", report.len());
	for (i, pair) in report.iter().enumerate() {
		println!("\nPair {} (distance {}):", i + 1, pair.distance);
		println!("  {}", pair.first.display());
		println!("  {}", pair.second.display());
	}
}

fn output_json( report: &SimilarityReport<PathBuf>, run: &FingerprintRun<PathBuf> ) -> Result<(), serde_json::Error> {
	let output = JsonOutput {
		pairs: report.pairs(),
		fingerprints: run.fingerprints.iter()
			.map(|(path, fp)| JsonFingerprint { path: path.as_path(), fingerprint: fp.to_string() })
			.collect(),
		failures: run.failures.iter()
			.map(|(path, e)| JsonFailure { path: path.as_path(), error: e.to_string() })
			.collect(),
	};
	println!("{}", serde_json::to_string_pretty( &output )?);
	return Ok(());
}

//Debug function to compare two images and print the internal statistics
fn debug_mode( cli: &Cli, config: &ConfigOptions ) -> Result<ExitCode, Box<dyn Error>> {
	if cli.dir_or_file.len() != 2 {
		eprintln!("Error: Debug mode requires exactly 2 paths to images.");
		return Ok(ExitCode::FAILURE);
	}

	let first = Path::new( &cli.dir_or_file[0] );
	let second = Path::new( &cli.dir_or_file[1] );

	let a = compute_fingerprint_with( &load_image_from_file( first )?, &config.hash )?;
	let b = compute_fingerprint_with( &load_image_from_file( second )?, &config.hash )?;
	let distance = a.hamming( &b )?;

	println!("Fingerprint First:  {}", a);
	println!("Fingerprint Second: {}", b);
	println!("Bits set First: {} Second: {} (of {})", a.count_ones(), b.count_ones(), a.bit_len());
	println!("Hamming distance: {}", distance);
	println!("Are both images similar? (threshold {}): {}", config.threshold, distance <= config.threshold);

	return Ok(ExitCode::SUCCESS);
}
