//! Streaming separable image rescaler
//!
//! Rescales a single-channel `f32` sample plane between arbitrary
//! resolutions by separable convolution with a selectable reconstruction
//! filter. The engine is streaming: feed source rows with
//! [`Resampler::put_line`], pull destination rows with
//! [`Resampler::get_line`] as soon as they are computable, and only a small
//! pool of intermediate rows is ever held in memory.
//!
//! Multi-channel images are driven externally: create one engine per
//! channel (sharing the contributor tables via [`Resampler::clists`]) and
//! feed them in lockstep. See `src/bin/streamscale` for a complete
//! gamma-correct driver.
//!
//! # Module structure
//! - `filters`: analytic filter kernels and the named registry
//! - `contrib`: boundary operators and contributor-table construction
//! - `scanbuf`: the fixed-capacity intermediate row pool
//! - `engine`: the put/pull streaming state machine
//!
//! ```
//! use streamscale::{Params, Resampler, Scanline, Status};
//!
//! let mut r = Resampler::new(4, 4, 2, 2, &Params::default());
//! assert_eq!(r.status(), Status::Okay);
//! let row = [0.25f32, 0.5, 0.75, 1.0];
//! let mut out = Vec::new();
//! for _ in 0..4 {
//!     assert!(r.put_line(&row));
//!     while let Scanline::Line(line) = r.get_line() {
//!         out.push(line.to_vec());
//!     }
//! }
//! assert_eq!(out.len(), 2);
//! ```

pub mod contrib;
pub mod engine;
pub mod filters;
mod scanbuf;

#[cfg(test)]
mod tests_advanced;

pub use contrib::{build_contribs, AxisContribs, Boundary, Contrib};
pub use engine::{Params, Resampler, Sample, Scanline, Status, MAX_DIMENSION};
pub use filters::{filter_count, filter_name, Filter, DEFAULT_FILTER_NAME};
pub use scanbuf::MAX_SCAN_BUF_SIZE;
