//! Invariant tests: weight-table properties, conservation laws, axis
//! independence, error stickiness

use proptest::prelude::*;

use crate::contrib::{build_contribs, AxisContribs};
use crate::filters::ALL_FILTERS;
use crate::{Boundary, Filter, Params, Resampler, Scanline, Status};

const BOUNDARIES: [Boundary; 3] = [Boundary::Clamp, Boundary::Reflect, Boundary::Wrap];

/// Apply one axis's contributor table to a row, the way the engine's inner
/// loop does.
fn apply(contribs: &AxisContribs, src: &[f32]) -> Vec<f32> {
    (0..contribs.dst_len())
        .map(|i| {
            contribs
                .list(i)
                .iter()
                .map(|p| src[p.pixel as usize] * p.weight)
                .sum()
        })
        .collect()
}

fn drive(r: &mut Resampler, src: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let mut out = Vec::new();
    for row in src {
        assert!(r.put_line(row));
        while let Scanline::Line(line) = r.get_line() {
            out.push(line.to_vec());
        }
    }
    while let Scanline::Line(line) = r.get_line() {
        out.push(line.to_vec());
    }
    out
}

// ============================================================================
// Contributor-table invariants
// ============================================================================

proptest! {
    #[test]
    fn prop_weights_sum_to_one_and_indices_in_range(
        src_len in 1usize..48,
        dst_len in 1usize..48,
        filter_idx in 0usize..ALL_FILTERS.len(),
        boundary_idx in 0usize..3,
    ) {
        let filter = ALL_FILTERS[filter_idx];
        let boundary = BOUNDARIES[boundary_idx];
        let c = build_contribs(src_len, dst_len, boundary, filter, 1.0, 0.0)
            .expect("plan must build for sane dimensions");
        prop_assert_eq!(c.dst_len(), dst_len);

        for i in 0..dst_len {
            let list = c.list(i);
            prop_assert!(!list.is_empty(), "dst {} has no contributors", i);

            let sum: f32 = list.iter().map(|p| p.weight).sum();
            // The residual fold pins the sequential sum at 1.0; re-summing
            // tolerates one rounding step per entry.
            let tol = 1e-6 * (1.0 + list.len() as f32);
            prop_assert!(
                (sum - 1.0).abs() <= tol,
                "dst {} weights sum to {} ({} entries)", i, sum, list.len()
            );

            for p in list {
                prop_assert!((p.pixel as usize) < src_len,
                    "dst {} references source {} outside [0, {})", i, p.pixel, src_len);
                prop_assert!(p.weight.is_finite());
                prop_assert!(p.weight != 0.0, "zero weights must be omitted");
            }
        }
    }

    #[test]
    fn prop_weights_sum_holds_with_scale_and_offset(
        src_len in 2usize..32,
        dst_len in 2usize..32,
        filter_scale in prop::sample::select(vec![1.0f32, 1.5, 2.0, 3.0]),
        src_ofs in prop::sample::select(vec![-0.75f32, -0.5, 0.0, 0.25, 1.0]),
    ) {
        let c = build_contribs(src_len, dst_len, Boundary::Reflect,
            Filter::Mitchell, filter_scale, src_ofs)
            .expect("plan must build");
        for i in 0..dst_len {
            let list = c.list(i);
            let sum: f32 = list.iter().map(|p| p.weight).sum();
            let tol = 1e-6 * (1.0 + list.len() as f32);
            prop_assert!((sum - 1.0).abs() <= tol);
            for p in list {
                prop_assert!((p.pixel as usize) < src_len);
            }
        }
    }
}

#[test]
fn test_dyadic_weights_sum_exactly() {
    // Box and tent tables at dyadic ratios carry exactly representable
    // weights, so the unity sum is bit-exact.
    for (src, dst, filter) in [
        (8usize, 8usize, Filter::Tent),
        (8, 4, Filter::Box),
        (4, 8, Filter::Tent),
        (16, 2, Filter::Box),
    ] {
        let c = build_contribs(src, dst, Boundary::Clamp, filter, 1.0, 0.0).unwrap();
        for i in 0..dst {
            let sum: f32 = c.list(i).iter().map(|p| p.weight).sum();
            assert_eq!(sum, 1.0, "{}->{} {:?} dst {}", src, dst, filter, i);
        }
    }
}

#[test]
fn test_unit_impulse_identity_at_unity_scale() {
    // At unity scale any filter with support >= 0.5 must return an impulse
    // peaked at its own index with unit mass.
    let src_len = 9;
    for filter in [
        Filter::Box,
        Filter::Tent,
        Filter::Bell,
        Filter::BSpline,
        Filter::Mitchell,
        Filter::Lanczos3,
        Filter::Gaussian,
        Filter::Kaiser,
    ] {
        let c = build_contribs(src_len, src_len, Boundary::Clamp, filter, 1.0, 0.0).unwrap();
        for k in 0..src_len {
            let mut row = vec![0.0f32; src_len];
            row[k] = 1.0;
            let out = apply(&c, &row);

            let argmax = out
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(argmax, k, "{:?}: impulse at {} peaked at {}", filter, k, argmax);

            let mass: f32 = out.iter().sum();
            assert!(
                (mass - 1.0).abs() < 1e-5,
                "{:?}: impulse at {} has mass {}",
                filter,
                k,
                mass
            );
        }
    }
}

// ============================================================================
// Engine conservation laws
// ============================================================================

#[test]
fn test_constant_plane_preserved_for_all_filters_and_boundaries() {
    let src = vec![vec![0.7f32; 7]; 5];
    for filter in ALL_FILTERS {
        for boundary in BOUNDARIES {
            let mut r = Resampler::new(
                7,
                5,
                4,
                6,
                &Params {
                    boundary,
                    filter_name: Some(filter.name().to_string()),
                    ..Params::default()
                },
            );
            assert_eq!(r.status(), Status::Okay);
            let out = drive(&mut r, &src);
            assert_eq!(out.len(), 6);
            for (y, row) in out.iter().enumerate() {
                for (x, &v) in row.iter().enumerate() {
                    assert!(
                        (v - 0.7).abs() < 1e-5,
                        "{} / {:?}: constant drifted to {} at ({}, {})",
                        filter.name(),
                        boundary,
                        v,
                        x,
                        y
                    );
                }
            }
        }
    }
}

#[test]
fn test_row_conservation_across_ratios() {
    // Feeding exactly src_y rows always yields exactly dst_y rows, then End.
    for (src_y, dst_y) in [(3usize, 7usize), (7, 3), (1, 5), (5, 1), (1, 1), (6, 6)] {
        let src = vec![vec![0.25f32; 5]; src_y];
        let mut r = Resampler::new(5, src_y, 5, dst_y, &Params::default());
        assert_eq!(r.status(), Status::Okay);
        let out = drive(&mut r, &src);
        assert_eq!(out.len(), dst_y, "{}->{} produced {}", src_y, dst_y, out.len());
        assert_eq!(r.get_line(), Scanline::End);
        assert!(!r.put_line(&src[0]), "engine must refuse rows past src_y");
    }
}

#[test]
fn test_get_line_not_ready_until_fed() {
    let mut r = Resampler::new(
        4,
        4,
        4,
        4,
        &Params {
            filter_name: Some("tent".to_string()),
            ..Params::default()
        },
    );
    assert_eq!(r.get_line(), Scanline::NotReady, "nothing fed yet");
    assert!(r.put_line(&[1.0, 2.0, 3.0, 4.0]));
    // Row 0 of a unity tent needs only source row 0.
    assert!(matches!(r.get_line(), Scanline::Line(_)));
    assert_eq!(r.get_line(), Scanline::NotReady, "row 1 needs source row 1");
}

#[test]
fn test_axis_independence_by_transposition() {
    // Separable filtering commutes with transposition: rescaling the
    // transposed plane with swapped dimensions gives the transposed result.
    fn transpose(p: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let h = p.len();
        let w = p[0].len();
        (0..w)
            .map(|x| (0..h).map(|y| p[y][x]).collect())
            .collect()
    }

    let src: Vec<Vec<f32>> = (0..5)
        .map(|y| (0..7).map(|x| ((x * 3 + y * 5) % 11) as f32 / 11.0).collect())
        .collect();
    let params = Params {
        filter_name: Some("mitchell".to_string()),
        ..Params::default()
    };

    let mut a = Resampler::new(7, 5, 4, 6, &params);
    let direct = drive(&mut a, &src);

    let mut b = Resampler::new(5, 7, 6, 4, &params);
    let swapped = transpose(&drive(&mut b, &transpose(&src)));

    assert_eq!(direct.len(), swapped.len());
    for (y, (ra, rb)) in direct.iter().zip(&swapped).enumerate() {
        for (x, (va, vb)) in ra.iter().zip(rb).enumerate() {
            assert!(
                (va - vb).abs() < 1e-4,
                "axis orders disagree at ({}, {}): {} vs {}",
                x,
                y,
                va,
                vb
            );
        }
    }
}

#[test]
fn test_shared_clists_drive_identical_engines() {
    let src: Vec<Vec<f32>> = (0..6)
        .map(|y| (0..6).map(|x| (x as f32 * 0.1 + y as f32 * 0.05).sin()).collect())
        .collect();
    let params = Params {
        filter_name: Some("lanczos3".to_string()),
        ..Params::default()
    };

    let mut a = Resampler::new(6, 6, 9, 4, &params);
    assert_eq!(a.status(), Status::Okay);
    let (cx, cy) = a.clists();

    // A sibling engine borrows the tables instead of rebuilding them; the
    // filter name is irrelevant once both tables are supplied.
    let mut b = Resampler::new(
        6,
        6,
        9,
        4,
        &Params {
            clist_x: Some(cx),
            clist_y: Some(cy),
            ..Params::default()
        },
    );
    assert_eq!(b.status(), Status::Okay);

    assert_eq!(drive(&mut a, &src), drive(&mut b, &src));
}

// ============================================================================
// Error behavior
// ============================================================================

#[test]
fn test_bad_filter_name_is_sticky() {
    let mut r = Resampler::new(
        4,
        4,
        4,
        4,
        &Params {
            filter_name: Some("lanczos5".to_string()),
            ..Params::default()
        },
    );
    assert_eq!(r.status(), Status::BadFilterName);
    assert!(!r.put_line(&[0.0; 4]));
    assert_eq!(r.get_line(), Scanline::NotReady);
    r.restart();
    assert_eq!(r.status(), Status::BadFilterName, "restart must not clear errors");
}

#[test]
fn test_scan_buffer_exhaustion_is_sticky() {
    // A 16384 -> 1 vertical collapse with lanczos12 references every source
    // row from the single destination row, so no row can be retired and the
    // pool must overflow after MAX_SCAN_BUF_SIZE puts.
    let mut r = Resampler::new(
        1,
        16384,
        1,
        1,
        &Params {
            filter_name: Some("lanczos12".to_string()),
            ..Params::default()
        },
    );
    assert_eq!(r.status(), Status::Okay);

    let row = [0.5f32];
    for i in 0..crate::MAX_SCAN_BUF_SIZE {
        assert!(r.put_line(&row), "put {} should fit the pool", i);
    }
    assert_eq!(r.get_line(), Scanline::NotReady);
    assert!(!r.put_line(&row), "pool overflow must fail the put");
    assert_eq!(r.status(), Status::ScanBufferFull);
    assert!(!r.put_line(&row), "error is sticky");
    assert_eq!(r.get_line(), Scanline::NotReady);
}
