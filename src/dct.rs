//! Type-II discrete cosine transform over square grids.
//!
//! Coefficients are unnormalised: `X[k] = 2 * sum(x[n] * cos(pi * k * (2n + 1) / 2N))`.
//! Every coefficient shares the same scale, so thresholding against a median
//! is unaffected by the missing orthonormal factors.

use std::f64::consts::PI;


pub struct DctPlan {
	n : usize,
	cos_table : Vec<f64>,	//cos_table[k * n + i] is the basis value for frequency k at sample i
}

impl DctPlan {

	pub fn new( n: usize ) -> DctPlan {
		let mut cos_table = Vec::with_capacity( n * n );
		for k in 0..n {
			for i in 0..n {
				cos_table.push( ( PI * (k as f64) * ((2 * i + 1) as f64) / ((2 * n) as f64) ).cos() );
			}
		}
		return DctPlan { n, cos_table };
	}

	pub fn size( &self ) -> usize {
		return self.n;
	}

	//1-D transform of exactly n samples
	pub fn transform( &self, input: &[f64], output: &mut [f64] ) {
		debug_assert_eq!( input.len(), self.n );
		debug_assert_eq!( output.len(), self.n );

		for (k, out) in output.iter_mut().enumerate() {
			let basis = &self.cos_table[ k * self.n .. (k + 1) * self.n ];
			let sum : f64 = input.iter().zip(basis).map(|(x, c)| x * c).sum();
			*out = 2.0 * sum;
		}
	}

	/// Separable 2-D transform of a row-major `n x n` grid: every row first,
	/// then every column of the row result.
	pub fn transform_2d( &self, grid: &[f64] ) -> Vec<f64> {
		let n = self.n;
		debug_assert_eq!( grid.len(), n * n );

		let mut rows = vec![0f64; n * n];
		for r in 0..n {
			self.transform( &grid[ r * n .. (r + 1) * n ], &mut rows[ r * n .. (r + 1) * n ] );
		}

		let mut out = vec![0f64; n * n];
		let mut column = vec![0f64; n];
		let mut column_out = vec![0f64; n];
		for c in 0..n {
			for r in 0..n {
				column[r] = rows[ r * n + c ];
			}
			self.transform( &column, &mut column_out );
			for r in 0..n {
				out[ r * n + c ] = column_out[r];
			}
		}

		return out;
	}
}

/// Copy the top-left `size x size` block out of a row-major `side x side` matrix.
pub fn crop_low_frequencies( matrix: &[f64], side: usize, size: usize ) -> Vec<f64> {
	let mut block = Vec::with_capacity( size * size );
	for r in 0..size {
		block.extend_from_slice( &matrix[ r * side .. r * side + size ] );
	}
	return block;
}
