use std::fmt::Debug;
use std::sync::mpsc::channel;
use std::sync::Arc;

use image::GrayImage;
use indicatif::ProgressBar;
use threadpool::ThreadPool;
use tracing::{info, warn};

use crate::config::{ConfigOptions, HashConfig};
use crate::dct::DctPlan;
use crate::fingerprint::Fingerprint;
use crate::image_error::{FingerprintError, Result};
use crate::imagehash::{compute_fingerprint_planned, ImageHandle};


/// Supplies decoded pixels for an identifier.
pub trait ImageLoader<K>: Send + Sync {
	fn load( &self, id: &K ) -> Result<GrayImage>;
}

impl<K, F> ImageLoader<K> for F
where
	F: Fn(&K) -> Result<GrayImage> + Send + Sync,
{
	fn load( &self, id: &K ) -> Result<GrayImage> {
		return self( id );
	}
}

/// Fingerprints in input order, and the images that could not be fingerprinted.
#[derive(Debug)]
pub struct FingerprintRun<K> {
	pub fingerprints : Vec<(K, Fingerprint)>,
	pub failures : Vec<(K, FingerprintError)>,
}

impl<K> FingerprintRun<K> {
	pub fn total( &self ) -> usize {
		return self.fingerprints.len() + self.failures.len();
	}
}

/// Load and fingerprint every identifier on `config.num_threads` workers.
/// A failed image is logged and reported in `failures`, never fatal to the batch.
pub fn fingerprint_images<K, L>( ids: Vec<K>, loader: L, config: &ConfigOptions ) -> Result<FingerprintRun<K>>
where
	K: Clone + Debug + Send + 'static,
	L: ImageLoader<K> + 'static,
{
	let loader = Arc::new( loader );
	let jobs = ids.into_iter().map(|id| (id, ())).collect();
	return run_jobs( jobs, config, move |id: &K, _: (), hash: &HashConfig, plan: &DctPlan| {
		let pixels = loader.load( id )?;
		return compute_fingerprint_planned( &pixels, hash, plan );
	});
}

/// Fingerprint grids the caller has already decoded.
pub fn fingerprint_handles<K>( handles: Vec<ImageHandle<K>>, config: &ConfigOptions ) -> Result<FingerprintRun<K>>
where
	K: Clone + Debug + Send + 'static,
{
	let jobs = handles.into_iter().map(|h| (h.id, h.pixels)).collect();
	return run_jobs( jobs, config, |_: &K, pixels: GrayImage, hash: &HashConfig, plan: &DctPlan| {
		return compute_fingerprint_planned( &pixels, hash, plan );
	});
}

fn run_jobs<K, T, F>( jobs: Vec<(K, T)>, config: &ConfigOptions, work: F ) -> Result<FingerprintRun<K>>
where
	K: Clone + Debug + Send + 'static,
	T: Send + 'static,
	F: Fn(&K, T, &HashConfig, &DctPlan) -> Result<Fingerprint> + Send + Sync + 'static,
{
	config.validate()?;

	let mut run = FingerprintRun { fingerprints: Vec::new(), failures: Vec::new() };
	if jobs.is_empty() {
		return Ok(run);
	}

	let num_threads = (config.num_threads as usize).min( jobs.len() );
	let ids : Vec<K> = jobs.iter().map(|(id, _)| id.clone()).collect();
	let hash = config.hash;
	let work = Arc::new( work );
	//One cosine table for the whole batch
	let plan = Arc::new( DctPlan::new( hash.side()? as usize ) );

	//Calculate the fingerprints on n threads
	let pool = ThreadPool::new( num_threads );

	let (tx, rx) = channel();
	for (index, (id, input)) in jobs.into_iter().enumerate() {
		let tx = tx.clone();
		let work = Arc::clone( &work );
		let plan = Arc::clone( &plan );
		pool.execute(move|| {
			let _ = tx.send( (index, (*work)( &id, input, &hash, &plan )) );
		});
	}
	drop(tx);

	let progress_bar = if config.show_progress { ProgressBar::new( ids.len() as u64 ) } else { ProgressBar::hidden() };

	//Collate the output of the threads back into input order
	let mut slots : Vec<Option<Result<Fingerprint>>> = (0..ids.len()).map(|_| None).collect();
	for (index, t_result) in rx.into_iter() {
		slots[index] = Some(t_result);
		progress_bar.inc(1);
	}
	progress_bar.finish();

	//A job that panicked never sent its result
	for (id, slot) in ids.into_iter().zip(slots) {
		let result = slot.unwrap_or_else(|| Err(FingerprintError::DecodeError(format!("Error: Worker stopped before finishing {:?}", id))));
		match result {
			Ok(fp) => run.fingerprints.push( (id, fp) ),
			Err(e) if e.is_recoverable() => run.failures.push( (id, e) ),
			Err(e) => return Err(e),
		}
	}

	//Logged after the bar is finished, as printing them live disrupts it
	for (id, e) in &run.failures {
		warn!( "excluding {:?}: {}", id, e );
	}
	info!( fingerprinted = run.fingerprints.len(), failed = run.failures.len(), "fingerprinting finished" );

	return Ok(run);
}
