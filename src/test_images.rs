//! Synthetic photos for tests. Smooth value noise has energy spread over all
//! the low frequencies, which is what the hash looks at, so unrelated seeds
//! give unrelated fingerprints and resampling barely moves any coefficient.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, GrayImage, Luma};


struct XorShift(u64);

impl XorShift {
	fn next_unit( &mut self ) -> f64 {
		self.0 ^= self.0 << 13;
		self.0 ^= self.0 >> 7;
		self.0 ^= self.0 << 17;
		(self.0 >> 11) as f64 / (1u64 << 53) as f64
	}
}

struct Lattice {
	cells : usize,
	values : Vec<f64>,
}

impl Lattice {
	fn new( cells: usize, rng: &mut XorShift ) -> Lattice {
		let values = (0..(cells + 1) * (cells + 1)).map(|_| rng.next_unit() * 2.0 - 1.0).collect();
		Lattice { cells, values }
	}

	fn at( &self, u: f64, v: f64 ) -> f64 {
		let fx = u * self.cells as f64;
		let fy = v * self.cells as f64;
		let x0 = (fx.floor() as usize).min(self.cells - 1);
		let y0 = (fy.floor() as usize).min(self.cells - 1);
		let tx = smoothstep( fx - x0 as f64 );
		let ty = smoothstep( fy - y0 as f64 );
		let stride = self.cells + 1;
		let v00 = self.values[ y0 * stride + x0 ];
		let v10 = self.values[ y0 * stride + x0 + 1 ];
		let v01 = self.values[ (y0 + 1) * stride + x0 ];
		let v11 = self.values[ (y0 + 1) * stride + x0 + 1 ];
		let top = v00 + (v10 - v00) * tx;
		let bottom = v01 + (v11 - v01) * tx;
		top + (bottom - top) * ty
	}
}

fn smoothstep( t: f64 ) -> f64 {
	let t = t.clamp(0.0, 1.0);
	t * t * (3.0 - 2.0 * t)
}

/// Two octaves of value noise, kept well inside 0..255 so filters never clip.
pub fn photo( width: u32, height: u32, seed: u64 ) -> GrayImage {
	let mut rng = XorShift( seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1 );
	let coarse = Lattice::new( 6, &mut rng );
	let fine = Lattice::new( 13, &mut rng );

	GrayImage::from_fn( width, height, |x, y| {
		let u = (x as f64 + 0.5) / width as f64;
		let v = (y as f64 + 0.5) / height as f64;
		let n = (coarse.at(u, v) + 0.35 * fine.at(u, v)) / 1.35;
		Luma([ (128.0 + 70.0 * n).round() as u8 ])
	})
}

pub fn negative( img: &GrayImage ) -> GrayImage {
	GrayImage::from_fn( img.width(), img.height(), |x, y| Luma([ 255 - img.get_pixel(x, y)[0] ]) )
}

pub fn brighten( img: &GrayImage, amount: u8 ) -> GrayImage {
	GrayImage::from_fn( img.width(), img.height(), |x, y| Luma([ img.get_pixel(x, y)[0].saturating_add(amount) ]) )
}

/// Round trip through a JPEG encoder at the given quality.
pub fn reencode_jpeg( img: &GrayImage, quality: u8 ) -> GrayImage {
	let mut bytes = Vec::new();
	JpegEncoder::new_with_quality( &mut bytes, quality )
		.encode( img.as_raw(), img.width(), img.height(), ColorType::L8 )
		.expect("jpeg encode");
	image::load_from_memory( &bytes ).expect("jpeg decode").to_luma8()
}
