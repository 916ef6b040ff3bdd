//! Reconstruction filter kernels and the filter registry
//!
//! Each kernel is an analytic 1-D function of the distance between a
//! destination sample's center and a source sample, together with a support
//! radius outside which it evaluates to zero. Kernels only run while the
//! contributor tables are built, so clarity wins over speed here.

use std::f32::consts::PI;

// ============================================================================
// Kernel functions
// ============================================================================

/// Box (pulse/Fourier window) kernel.
/// The interval is deliberately half-open: a source sample sitting exactly
/// `support` to the left of the center contributes, one exactly `support`
/// to the right does not.
#[inline]
pub fn box_kernel(t: f32) -> f32 {
    if (-0.5..0.5).contains(&t) {
        1.0
    } else {
        0.0
    }
}

/// Tent (box convolved with box) kernel, the bilinear/triangle filter.
#[inline]
pub fn tent_kernel(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        1.0 - t
    } else {
        0.0
    }
}

/// Bell (box convolved with itself twice) kernel, piecewise quadratic.
#[inline]
pub fn bell_kernel(t: f32) -> f32 {
    let t = t.abs();
    if t < 0.5 {
        0.75 - t * t
    } else if t < 1.5 {
        let t = t - 1.5;
        0.5 * (t * t)
    } else {
        0.0
    }
}

/// Cubic B-spline kernel (box convolved with itself three times).
/// Smooth but non-interpolating; never rings.
#[inline]
pub fn b_spline_kernel(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        let tt = t * t;
        0.5 * tt * t - tt + 2.0 / 3.0
    } else if t < 2.0 {
        let t = 2.0 - t;
        (1.0 / 6.0) * (t * t * t)
    } else {
        0.0
    }
}

/// Mitchell, D. and A. Netravali, "Reconstruction Filters in Computer
/// Graphics", Computer Graphics, Vol. 22, No. 4, pp. 221-228.
///
/// (B, C) picks the member of the family:
/// (1/3, 1/3) - the authors' recommendation
/// (1, 0)     - cubic B-spline
/// (0, 0.5)   - Catmull-Rom spline
/// (0, C)     - cardinal cubic splines
/// (B, 0)     - Duff's tensioned B-splines
#[inline]
fn mitchell(t: f32, b: f32, c: f32) -> f32 {
    let t = t.abs();
    let tt = t * t;
    if t < 1.0 {
        let r = (12.0 - 9.0 * b - 6.0 * c) * (t * tt)
            + (-18.0 + 12.0 * b + 6.0 * c) * tt
            + (6.0 - 2.0 * b);
        r / 6.0
    } else if t < 2.0 {
        let r = (-b - 6.0 * c) * (t * tt)
            + (6.0 * b + 30.0 * c) * tt
            + (-12.0 * b - 48.0 * c) * t
            + (8.0 * b + 24.0 * c);
        r / 6.0
    } else {
        0.0
    }
}

/// Mitchell-Netravali with B = C = 1/3. Minimizes blur and ringing together.
#[inline]
pub fn mitchell_kernel(t: f32) -> f32 {
    mitchell(t, 1.0 / 3.0, 1.0 / 3.0)
}

/// Catmull-Rom spline (B = 0, C = 0.5). Sharp interpolating spline.
#[inline]
pub fn catmull_rom_kernel(t: f32) -> f32 {
    mitchell(t, 0.0, 0.5)
}

/// Dodgson, N., "Quadratic Interpolation for Image Resampling".
/// R = 1.0 interpolating, R = 0.5 approximating, R = 0.8 a useful mix.
#[inline]
fn quadratic(t: f32, r: f32) -> f32 {
    let t = t.abs();
    if t < 1.5 {
        let tt = t * t;
        if t <= 0.5 {
            (-2.0 * r) * tt + 0.5 * (r + 1.0)
        } else {
            (r * tt) + (-2.0 * r - 0.5) * t + (3.0 / 4.0) * (r + 1.0)
        }
    } else {
        0.0
    }
}

#[inline]
pub fn quadratic_interp_kernel(t: f32) -> f32 {
    quadratic(t, 1.0)
}

#[inline]
pub fn quadratic_approx_kernel(t: f32) -> f32 {
    quadratic(t, 0.5)
}

#[inline]
pub fn quadratic_mix_kernel(t: f32) -> f32 {
    quadratic(t, 0.8)
}

/// Normalized sinc, `sin(pi x) / (pi x)`, with a Taylor expansion near zero
/// where the direct quotient loses precision.
#[inline]
pub fn sinc(x: f32) -> f32 {
    let x = x * PI;
    if x > -0.01 && x < 0.01 {
        return 1.0 + x * x * (-1.0 / 6.0 + x * x * (1.0 / 120.0));
    }
    x.sin() / x
}

/// Snap near-zero kernel values to exactly zero so windowed-sinc tails don't
/// fill the contributor tables with denormal-scale weights.
#[inline]
fn clean(t: f32) -> f32 {
    const EPSILON: f32 = 0.0000125;
    if t.abs() < EPSILON {
        0.0
    } else {
        t
    }
}

#[inline]
fn blackman_window(x: f32) -> f32 {
    // Exact Blackman coefficients, not the common (0.42, 0.5, 0.08) rounding.
    0.42659071 + 0.49656062 * (PI * x).cos() + 0.07684867 * (2.0 * PI * x).cos()
}

/// Blackman-windowed sinc, support 3.
#[inline]
pub fn blackman_kernel(t: f32) -> f32 {
    let t = t.abs();
    if t < 3.0 {
        clean(sinc(t) * blackman_window(t / 3.0))
    } else {
        0.0
    }
}

/// Truncated Gaussian under a Blackman window.
#[inline]
pub fn gaussian_kernel(t: f32) -> f32 {
    const SUPPORT: f32 = 1.25;
    let t = t.abs();
    if t < SUPPORT {
        clean((-2.0 * t * t).exp() * (2.0 / PI).sqrt() * blackman_window(t / SUPPORT))
    } else {
        0.0
    }
}

/// Lanczos-windowed sinc -- see "Jim Blinn's Corner: Dirty Pixels" pg. 26.
#[inline]
fn lanczos(t: f32, lobes: f32) -> f32 {
    let t = t.abs();
    if t < lobes {
        clean(sinc(t) * sinc(t / lobes))
    } else {
        0.0
    }
}

#[inline]
pub fn lanczos3_kernel(t: f32) -> f32 {
    lanczos(t, 3.0)
}

#[inline]
pub fn lanczos4_kernel(t: f32) -> f32 {
    lanczos(t, 4.0)
}

#[inline]
pub fn lanczos6_kernel(t: f32) -> f32 {
    lanczos(t, 6.0)
}

#[inline]
pub fn lanczos12_kernel(t: f32) -> f32 {
    lanczos(t, 12.0)
}

/// Zeroth-order modified Bessel function of the first kind, by ascending
/// series. Converges quickly for the argument range the Kaiser window uses.
#[inline]
fn bessel0(x: f32) -> f32 {
    const EPSILON_RATIO: f32 = 1e-16;
    let xh = 0.5 * x;
    let mut sum = 1.0f32;
    let mut pow = 1.0f32;
    let mut k = 0;
    let mut ds = 1.0f32;
    while ds > sum * EPSILON_RATIO {
        k += 1;
        pow *= xh / k as f32;
        ds = pow * pow;
        sum += ds;
    }
    sum
}

#[inline]
fn kaiser_window(alpha: f32, half_width: f32, x: f32) -> f32 {
    let ratio = x / half_width;
    bessel0(alpha * (1.0 - ratio * ratio).sqrt()) / bessel0(alpha)
}

/// Kaiser-windowed sinc, support 3. The window shape parameter is derived
/// from a 40 dB stop-band attenuation target.
#[inline]
pub fn kaiser_kernel(t: f32) -> f32 {
    const SUPPORT: f32 = 3.0;
    let t = t.abs();
    if t < SUPPORT {
        let att = 40.0f32;
        let alpha = ((0.58417 * (att - 20.96)).ln() * 0.4).exp() + 0.07886 * (att - 20.96);
        clean(sinc(t) * kaiser_window(alpha, SUPPORT, t))
    } else {
        0.0
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Filter selected when the caller passes no name.
pub const DEFAULT_FILTER_NAME: &str = "lanczos4";

/// A reconstruction filter from the registry.
///
/// Fieldless so the engine can copy it around freely; evaluation dispatches
/// to the kernel functions above, which only matters at plan-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Box,
    Tent,
    Bell,
    BSpline,
    Mitchell,
    Lanczos3,
    Blackman,
    Lanczos4,
    Lanczos6,
    Lanczos12,
    Kaiser,
    Gaussian,
    CatmullRom,
    QuadraticInterp,
    QuadraticApprox,
    QuadraticMix,
}

/// Registry order is stable; `filter_name(i)` enumerates in this order.
pub const ALL_FILTERS: [Filter; 16] = [
    Filter::Box,
    Filter::Tent,
    Filter::Bell,
    Filter::BSpline,
    Filter::Mitchell,
    Filter::Lanczos3,
    Filter::Blackman,
    Filter::Lanczos4,
    Filter::Lanczos6,
    Filter::Lanczos12,
    Filter::Kaiser,
    Filter::Gaussian,
    Filter::CatmullRom,
    Filter::QuadraticInterp,
    Filter::QuadraticApprox,
    Filter::QuadraticMix,
];

impl Filter {
    /// Registry name, matched exactly by [`Filter::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Filter::Box => "box",
            Filter::Tent => "tent",
            Filter::Bell => "bell",
            Filter::BSpline => "b-spline",
            Filter::Mitchell => "mitchell",
            Filter::Lanczos3 => "lanczos3",
            Filter::Blackman => "blackman",
            Filter::Lanczos4 => "lanczos4",
            Filter::Lanczos6 => "lanczos6",
            Filter::Lanczos12 => "lanczos12",
            Filter::Kaiser => "kaiser",
            Filter::Gaussian => "gaussian",
            Filter::CatmullRom => "catmullrom",
            Filter::QuadraticInterp => "quadratic_interp",
            Filter::QuadraticApprox => "quadratic_approx",
            Filter::QuadraticMix => "quadratic_mix",
        }
    }

    /// Support radius; `eval` returns 0 for `|t| >= support` (and for the
    /// box filter's half-open right edge, at `t == support` exactly).
    pub fn support(self) -> f32 {
        match self {
            Filter::Box => 0.5,
            Filter::Tent => 1.0,
            Filter::Bell => 1.5,
            Filter::BSpline => 2.0,
            Filter::Mitchell => 2.0,
            Filter::Lanczos3 => 3.0,
            Filter::Blackman => 3.0,
            Filter::Lanczos4 => 4.0,
            Filter::Lanczos6 => 6.0,
            Filter::Lanczos12 => 12.0,
            Filter::Kaiser => 3.0,
            Filter::Gaussian => 1.25,
            Filter::CatmullRom => 2.0,
            Filter::QuadraticInterp | Filter::QuadraticApprox | Filter::QuadraticMix => 1.5,
        }
    }

    /// Evaluate the kernel at distance `t` from the sample center.
    #[inline]
    pub fn eval(self, t: f32) -> f32 {
        match self {
            Filter::Box => box_kernel(t),
            Filter::Tent => tent_kernel(t),
            Filter::Bell => bell_kernel(t),
            Filter::BSpline => b_spline_kernel(t),
            Filter::Mitchell => mitchell_kernel(t),
            Filter::Lanczos3 => lanczos3_kernel(t),
            Filter::Blackman => blackman_kernel(t),
            Filter::Lanczos4 => lanczos4_kernel(t),
            Filter::Lanczos6 => lanczos6_kernel(t),
            Filter::Lanczos12 => lanczos12_kernel(t),
            Filter::Kaiser => kaiser_kernel(t),
            Filter::Gaussian => gaussian_kernel(t),
            Filter::CatmullRom => catmull_rom_kernel(t),
            Filter::QuadraticInterp => quadratic_interp_kernel(t),
            Filter::QuadraticApprox => quadratic_approx_kernel(t),
            Filter::QuadraticMix => quadratic_mix_kernel(t),
        }
    }

    /// Exact-name lookup. No aliases and no case folding: an unknown name is
    /// the caller's error to report.
    pub fn from_name(name: &str) -> Option<Filter> {
        ALL_FILTERS.iter().copied().find(|f| f.name() == name)
    }
}

/// Number of registered filters.
pub fn filter_count() -> usize {
    ALL_FILTERS.len()
}

/// Name of the `i`-th registered filter, or `None` past the end.
pub fn filter_name(i: usize) -> Option<&'static str> {
    ALL_FILTERS.get(i).map(|f| f.name())
}

// ============================================================================
// Tests
// ============================================================================
