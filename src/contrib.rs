//! Boundary handling and contributor-table construction
//!
//! A contributor table maps every destination sample of one axis to the
//! compact list of source samples that feed it, with normalized weights.
//! Tables are built once per axis at engine creation and are immutable
//! afterwards, so both axes of an engine (and any number of sibling engines
//! driving other channels of the same image) can share them.

use crate::filters::Filter;

/// How out-of-range source indices are folded back into `[0, src_len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    /// Extend the edge sample outward.
    #[default]
    Clamp,
    /// Mirror at the edges.
    Reflect,
    /// Treat the axis as periodic.
    Wrap,
}

/// `x mod y` with the result always in `[0, y)`, including for negative `x`.
#[inline]
fn posmod(x: i32, y: i32) -> i32 {
    if x >= 0 {
        x % y
    } else {
        let m = (-x) % y;
        if m != 0 {
            y - m
        } else {
            m
        }
    }
}

/// Fold a possibly out-of-range source index back into `[0, src_len)`.
pub fn resolve_index(j: i32, src_len: i32, boundary: Boundary) -> i32 {
    if j < 0 {
        match boundary {
            Boundary::Reflect => {
                let n = -j;
                if n >= src_len {
                    src_len - 1
                } else {
                    n
                }
            }
            Boundary::Wrap => posmod(j, src_len),
            Boundary::Clamp => 0,
        }
    } else if j >= src_len {
        match boundary {
            Boundary::Reflect => {
                let n = (src_len - j) + (src_len - 1);
                if n < 0 {
                    0
                } else {
                    n
                }
            }
            Boundary::Wrap => posmod(j, src_len),
            Boundary::Clamp => src_len - 1,
        }
    } else {
        j
    }
}

/// One weighted source sample feeding a destination sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contrib {
    /// Source index, already boundary-resolved into `[0, src_len)`.
    pub pixel: u16,
    /// Normalized weight; each destination's weights sum to exactly 1.0.
    pub weight: f32,
}

/// The contributor table for one axis: one list per destination sample,
/// backed by a single flat pool.
#[derive(Debug, Clone)]
pub struct AxisContribs {
    // (start, len) into `pool`, one entry per destination sample.
    spans: Vec<(u32, u32)>,
    pool: Vec<Contrib>,
}

impl AxisContribs {
    /// Placeholder table for engines that failed construction; never
    /// consulted once the engine status is checked.
    pub(crate) fn empty() -> AxisContribs {
        AxisContribs {
            spans: Vec::new(),
            pool: Vec::new(),
        }
    }

    /// Number of destination samples covered by this table.
    #[inline]
    pub fn dst_len(&self) -> usize {
        self.spans.len()
    }

    /// Contributor list for destination sample `i`.
    #[inline]
    pub fn list(&self, i: usize) -> &[Contrib] {
        let (start, len) = self.spans[i];
        &self.pool[start as usize..(start + len) as usize]
    }

    /// Total number of `(pixel, weight)` entries across all lists. This is
    /// the multiply count of one full pass over the axis.
    #[inline]
    pub fn total_contribs(&self) -> u64 {
        self.pool.len() as u64
    }
}

/// Build the contributor table for one axis.
///
/// `filter_scale >= 1.0` widens the kernel beyond its native support (for
/// low-pass tuning); `src_ofs` shifts the geometric mapping in continuous
/// source coordinates. Returns `None` when any destination sample ends up
/// with an empty or all-zero footprint.
pub fn build_contribs(
    src_len: usize,
    dst_len: usize,
    boundary: Boundary,
    filter: Filter,
    filter_scale: f32,
    src_ofs: f32,
) -> Option<AxisContribs> {
    assert!(src_len > 0 && dst_len > 0);
    assert!(src_len <= u16::MAX as usize + 1);
    assert!(filter_scale > 0.0);

    let support = filter.support();
    let oo_filter_scale = 1.0 / filter_scale;

    // Sample centers sit at integer positions; sample i covers the continuous
    // interval [i - 0.5, i + 0.5).
    const NUDGE: f32 = 0.5;
    let xscale = dst_len as f32 / src_len as f32;

    // Minification stretches the kernel over the destination sample's whole
    // pre-image so the cutoff tracks the destination Nyquist rate; the kernel
    // argument is scaled to compensate. Magnification keeps the native width.
    let (half_width, arg_scale) = if xscale < 1.0 {
        ((support / xscale) * filter_scale, xscale * oo_filter_scale)
    } else {
        (support * filter_scale, oo_filter_scale)
    };

    // Pass 1: footprint bounds per destination sample, and the pool size.
    struct Bounds {
        center: f32,
        left: i32,
        right: i32,
    }
    let mut bounds = Vec::with_capacity(dst_len);
    let mut total = 0usize;
    for i in 0..dst_len {
        let center = (i as f32 + NUDGE) / xscale - NUDGE + src_ofs;
        let left = (center - half_width).floor() as i32;
        let right = (center + half_width).ceil() as i32;
        total += (right - left + 1) as usize;
        bounds.push(Bounds { center, left, right });
    }
    if total == 0 {
        return None;
    }

    // Pass 2: evaluate, normalize, resolve boundaries, fill the pool.
    let mut pool: Vec<Contrib> = Vec::with_capacity(total);
    let mut spans = Vec::with_capacity(dst_len);
    for b in &bounds {
        let start = pool.len();

        let mut raw_sum = 0.0f32;
        for j in b.left..=b.right {
            raw_sum += filter.eval((b.center - j as f32) * arg_scale);
        }
        if raw_sum == 0.0 {
            return None;
        }
        let norm = 1.0 / raw_sum;

        let mut emitted_sum = 0.0f32;
        let mut max_w = -1e20f32;
        let mut max_k = usize::MAX;
        for j in b.left..=b.right {
            let weight = filter.eval((b.center - j as f32) * arg_scale) * norm;
            if weight == 0.0 {
                continue;
            }
            let n = resolve_index(j, src_len as i32, boundary);
            debug_assert!(n >= 0 && (n as usize) < src_len);
            pool.push(Contrib {
                pixel: n as u16,
                weight,
            });
            emitted_sum += weight;
            if weight > max_w {
                max_w = weight;
                max_k = pool.len() - 1;
            }
        }
        if pool.len() == start {
            return None;
        }

        // Fold the normalization residual into the strongest entry so each
        // list sums to exactly 1.0 regardless of rounding.
        pool[max_k].weight += 1.0 - emitted_sum;

        spans.push((start as u32, (pool.len() - start) as u32));
    }

    Some(AxisContribs { spans, pool })
}
