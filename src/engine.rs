//! Streaming resample engine
//!
//! The engine rescales one sample plane as a push/pull state machine: the
//! caller feeds source rows top to bottom with [`Resampler::put_line`] and
//! drains finished destination rows with [`Resampler::get_line`] as soon as
//! enough source rows are buffered. Nothing is materialized beyond the pool
//! of intermediate rows the Y-axis footprint currently needs.
//!
//! All heavy lifting happens up front: both axis contributor tables are
//! built at construction, and after the pool warms up the per-row calls do
//! no allocation at all.

use std::sync::Arc;

use crate::contrib::{build_contribs, AxisContribs, Boundary};
use crate::filters::{Filter, DEFAULT_FILTER_NAME};
use crate::scanbuf::ScanBuf;

/// Sample type processed by the engine. One engine handles one channel;
/// multi-channel images run one engine per channel in lockstep.
pub type Sample = f32;

/// Upper bound on any plane dimension. Keeps contributor indices within
/// `u16` with plenty of margin.
pub const MAX_DIMENSION: usize = 16384;

/// Engine health. Errors are sticky: once set, every further `put_line`
/// fails and every `get_line` reports not-ready until the engine is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Okay,
    /// Contributor-table construction failed (degenerate footprint).
    OutOfMemory,
    /// The requested filter name is not in the registry.
    BadFilterName,
    /// `put_line` found no free pool slot.
    ScanBufferFull,
}

/// Result of one [`Resampler::get_line`] call.
#[derive(Debug, PartialEq)]
pub enum Scanline<'a> {
    /// The next destination row, valid until the next call on the engine.
    Line(&'a [Sample]),
    /// More source rows are needed first (or the engine is in an error
    /// state).
    NotReady,
    /// All `dst_y` rows have been produced.
    End,
}

/// Construction parameters. `Default` gives clamp boundaries, no output
/// clamping, the registry default filter, engine-built contributor tables,
/// native kernel width and zero offset on both axes.
#[derive(Debug, Clone)]
pub struct Params {
    pub boundary: Boundary,
    /// Output clamp range; clamping is disabled unless `sample_low <
    /// sample_high`.
    pub sample_low: Sample,
    pub sample_high: Sample,
    /// Registry name; `None` selects [`DEFAULT_FILTER_NAME`].
    pub filter_name: Option<String>,
    /// Caller-supplied X contributor table, e.g. shared from a sibling
    /// engine's [`Resampler::clists`]. Must cover `src_x -> dst_x`.
    pub clist_x: Option<Arc<AxisContribs>>,
    /// Caller-supplied Y contributor table. Must cover `src_y -> dst_y`.
    pub clist_y: Option<Arc<AxisContribs>>,
    pub filter_x_scale: f32,
    pub filter_y_scale: f32,
    pub src_x_ofs: f32,
    pub src_y_ofs: f32,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            boundary: Boundary::Clamp,
            sample_low: 0.0,
            sample_high: 0.0,
            filter_name: None,
            clist_x: None,
            clist_y: None,
            filter_x_scale: 1.0,
            filter_y_scale: 1.0,
            src_x_ofs: 0.0,
            src_y_ofs: 0.0,
        }
    }
}

pub struct Resampler {
    src_x: usize,
    src_y: usize,
    dst_x: usize,
    dst_y: usize,

    status: Status,
    // Output clamp range, inactive while lo >= hi.
    lo: Sample,
    hi: Sample,

    clist_x: Arc<AxisContribs>,
    clist_y: Arc<AxisContribs>,

    // Per-source-row bookkeeping for the Y axis: how many destination rows
    // still reference each source row, and whether it currently sits in the
    // pool.
    src_y_count: Vec<u32>,
    src_y_present: Vec<bool>,

    scan_buf: ScanBuf,

    // True = Y-first order: put_line stores raw source rows and X resampling
    // runs on the vertically filtered intermediate instead.
    delay_x_resample: bool,
    // Width of pooled rows: src_x when delaying X, dst_x otherwise.
    intermediate_x: usize,

    dst_buf: Vec<Sample>,
    // Vertical accumulator when delaying X; unused (empty) otherwise.
    tmp_buf: Vec<Sample>,

    cur_src_y: usize,
    cur_dst_y: usize,
}

// ============================================================================
// Per-axis kernels
// ============================================================================

/// Horizontal resample of one row through a contributor table.
fn resample_x(dst: &mut [Sample], src: &[Sample], clist: &AxisContribs) {
    for (i, out) in dst.iter_mut().enumerate() {
        let mut total = 0.0;
        for p in clist.list(i) {
            total += src[p.pixel as usize] * p.weight;
        }
        *out = total;
    }
}

/// First vertical contributor: overwrite, since the accumulator row still
/// holds the previous destination row.
fn scale_y_mov(tmp: &mut [Sample], src: &[Sample], weight: f32) {
    for (t, s) in tmp.iter_mut().zip(src) {
        *t = *s * weight;
    }
}

/// Subsequent vertical contributors accumulate.
fn scale_y_add(tmp: &mut [Sample], src: &[Sample], weight: f32) {
    for (t, s) in tmp.iter_mut().zip(src) {
        *t += *s * weight;
    }
}

// ============================================================================
// Engine
// ============================================================================

impl Resampler {
    /// Create an engine rescaling a `src_x * src_y` plane to `dst_x * dst_y`.
    ///
    /// Construction never panics on runtime errors; check [`Resampler::status`]
    /// before streaming. Zero or oversized dimensions are programming errors
    /// and assert.
    pub fn new(src_x: usize, src_y: usize, dst_x: usize, dst_y: usize, params: &Params) -> Resampler {
        assert!(src_x > 0 && src_x <= MAX_DIMENSION);
        assert!(src_y > 0 && src_y <= MAX_DIMENSION);
        assert!(dst_x > 0 && dst_x <= MAX_DIMENSION);
        assert!(dst_y > 0 && dst_y <= MAX_DIMENSION);

        let (clist_x, clist_y, status) =
            match Self::make_tables(src_x, src_y, dst_x, dst_y, params) {
                Ok((x, y)) => (x, y, Status::Okay),
                Err(status) => (
                    Arc::new(AxisContribs::empty()),
                    Arc::new(AxisContribs::empty()),
                    status,
                ),
            };

        let mut src_y_count = vec![0u32; src_y];
        let src_y_present = vec![false; src_y];

        let (delay_x_resample, intermediate_x) = if status == Status::Okay {
            for i in 0..dst_y {
                for p in clist_y.list(i) {
                    src_y_count[p.pixel as usize] += 1;
                }
            }
            Self::choose_axis_order(src_x, src_y, dst_x, dst_y, &clist_x, &clist_y)
        } else {
            (false, dst_x)
        };

        Resampler {
            src_x,
            src_y,
            dst_x,
            dst_y,
            status,
            lo: params.sample_low,
            hi: params.sample_high,
            clist_x,
            clist_y,
            src_y_count,
            src_y_present,
            scan_buf: ScanBuf::new(),
            delay_x_resample,
            intermediate_x,
            dst_buf: vec![0.0; dst_x],
            tmp_buf: if delay_x_resample {
                vec![0.0; intermediate_x]
            } else {
                Vec::new()
            },
            cur_src_y: 0,
            cur_dst_y: 0,
        }
    }

    fn make_tables(
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
        params: &Params,
    ) -> Result<(Arc<AxisContribs>, Arc<AxisContribs>), Status> {
        // The filter is looked up even when both tables are caller-supplied,
        // so a bad name is always reported.
        let name = params.filter_name.as_deref().unwrap_or(DEFAULT_FILTER_NAME);
        let filter = Filter::from_name(name).ok_or(Status::BadFilterName)?;

        let clist_x = match &params.clist_x {
            Some(c) => {
                assert_eq!(c.dst_len(), dst_x, "supplied X table covers the wrong width");
                Arc::clone(c)
            }
            None => build_contribs(
                src_x,
                dst_x,
                params.boundary,
                filter,
                params.filter_x_scale,
                params.src_x_ofs,
            )
            .map(Arc::new)
            .ok_or(Status::OutOfMemory)?,
        };

        let clist_y = match &params.clist_y {
            Some(c) => {
                assert_eq!(c.dst_len(), dst_y, "supplied Y table covers the wrong height");
                Arc::clone(c)
            }
            None => build_contribs(
                src_y,
                dst_y,
                params.boundary,
                filter,
                params.filter_y_scale,
                params.src_y_ofs,
            )
            .map(Arc::new)
            .ok_or(Status::OutOfMemory)?,
        };

        Ok((clist_x, clist_y))
    }

    /// Pick the axis order by estimating multiplies for each, weighting the
    /// Y axis 4/3 heavier for its worse cache behavior. Ties go to the order
    /// that buffers narrower rows.
    fn choose_axis_order(
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
        clist_x: &AxisContribs,
        clist_y: &AxisContribs,
    ) -> (bool, usize) {
        let x_ops = clist_x.total_contribs();
        let y_ops = clist_y.total_contribs();

        let xy_ops = x_ops * src_y as u64 + (4 * y_ops * dst_x as u64) / 3;
        let yx_ops = (4 * y_ops * src_x as u64) / 3 + x_ops * dst_y as u64;

        if xy_ops > yx_ops || (xy_ops == yx_ops && src_x < dst_x) {
            (true, src_x)
        } else {
            (false, dst_x)
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Both contributor tables, for sharing with sibling engines that drive
    /// other channels of the same image through identical geometry.
    pub fn clists(&self) -> (Arc<AxisContribs>, Arc<AxisContribs>) {
        (Arc::clone(&self.clist_x), Arc::clone(&self.clist_y))
    }

    /// Feed the next source row (`cur_src_y` increments on success). `row`
    /// must hold at least `src_x` samples. Returns false when all source
    /// rows were already fed or the engine is in an error state.
    pub fn put_line(&mut self, row: &[Sample]) -> bool {
        if self.status != Status::Okay {
            return false;
        }
        if self.cur_src_y >= self.src_y {
            return false;
        }
        assert!(row.len() >= self.src_x);

        let y = self.cur_src_y;

        // A row no destination row references is consumed without buffering.
        if self.src_y_count[y] == 0 {
            self.cur_src_y += 1;
            return true;
        }

        let Some(slot) = self.scan_buf.acquire(y as u16, self.intermediate_x) else {
            self.status = Status::ScanBufferFull;
            return false;
        };
        self.src_y_present[y] = true;

        if self.delay_x_resample {
            // Y-X order: buffer the row untouched at source width.
            debug_assert_eq!(self.intermediate_x, self.src_x);
            self.scan_buf
                .row_mut(slot)
                .copy_from_slice(&row[..self.src_x]);
        } else {
            // X-Y order: shrink (or stretch) horizontally on the way in.
            debug_assert_eq!(self.intermediate_x, self.dst_x);
            resample_x(self.scan_buf.row_mut(slot), row, &self.clist_x);
        }

        self.cur_src_y += 1;
        true
    }

    /// Pull the next destination row. Returns [`Scanline::NotReady`] until
    /// every source row the next destination row needs has been fed.
    pub fn get_line(&mut self) -> Scanline<'_> {
        if self.status != Status::Okay {
            return Scanline::NotReady;
        }
        if self.cur_dst_y == self.dst_y {
            return Scanline::End;
        }
        for p in self.clist_y.list(self.cur_dst_y) {
            if !self.src_y_present[p.pixel as usize] {
                return Scanline::NotReady;
            }
        }

        self.resample_y();
        self.cur_dst_y += 1;
        Scanline::Line(&self.dst_buf)
    }

    /// Vertically filter the pooled rows into the destination buffer (via
    /// the intermediate accumulator when X is delayed), releasing each
    /// source row that will never be referenced again.
    fn resample_y(&mut self) {
        let list = self.clist_y.list(self.cur_dst_y);

        for (i, p) in list.iter().enumerate() {
            let pix = p.pixel as usize;
            let slot = self
                .scan_buf
                .lookup(p.pixel)
                .expect("contributing source row must be pooled");

            {
                let src = self.scan_buf.row(slot);
                let acc: &mut [Sample] = if self.delay_x_resample {
                    &mut self.tmp_buf
                } else {
                    &mut self.dst_buf
                };
                if i == 0 {
                    scale_y_mov(acc, src, p.weight);
                } else {
                    scale_y_add(acc, src, p.weight);
                }
            }

            self.src_y_count[pix] -= 1;
            if self.src_y_count[pix] == 0 {
                self.src_y_present[pix] = false;
                self.scan_buf.release(slot);
            }
        }

        if self.delay_x_resample {
            resample_x(&mut self.dst_buf, &self.tmp_buf, &self.clist_x);
        }

        if self.lo < self.hi {
            for v in self.dst_buf.iter_mut() {
                *v = v.clamp(self.lo, self.hi);
            }
        }
    }

    /// Rewind to the input-nothing-yet state: cursors zeroed, reference
    /// counts rebuilt, the pool emptied cold. Contributor tables are kept.
    /// Does nothing if the engine is in an error state.
    pub fn restart(&mut self) {
        if self.status != Status::Okay {
            return;
        }
        self.cur_src_y = 0;
        self.cur_dst_y = 0;
        for c in self.src_y_count.iter_mut() {
            *c = 0;
        }
        for f in self.src_y_present.iter_mut() {
            *f = false;
        }
        for i in 0..self.dst_y {
            for p in self.clist_y.list(i) {
                self.src_y_count[p.pixel as usize] += 1;
            }
        }
        self.scan_buf.reset();
    }

    #[cfg(test)]
    pub(crate) fn delay_x(&self) -> bool {
        self.delay_x_resample
    }

    #[cfg(test)]
    pub(crate) fn refcounts(&self) -> &[u32] {
        &self.src_y_count
    }

    #[cfg(test)]
    pub(crate) fn pooled_rows(&self) -> usize {
        self.scan_buf.occupied()
    }
}
