//! streamscale - streaming image rescaler
//!
//! Demonstrates the intended multi-channel setup: the core rescales one
//! sample plane, so this driver runs four engines (RGBA) in lockstep over
//! the decoded rows, sharing a single pair of contributor tables between
//! them. Color channels are converted to linear light before filtering and
//! back afterwards; alpha is filtered as-is.

mod args;

use args::Args;
use clap::Parser;
use image::{ImageBuffer, Rgba};

use streamscale::{filter_count, filter_name, Params, Resampler, Scanline, Status};

// ============================================================================
// Progress bar
// ============================================================================

/// Print a progress bar to stderr (overwrites the current line)
fn print_progress(label: &str, progress: f32) {
    const BAR_WIDTH: usize = 30;
    let filled = (progress * BAR_WIDTH as f32).round() as usize;
    let empty = BAR_WIDTH.saturating_sub(filled);
    eprint!(
        "\r{}: [{}{}] {:3}%",
        label,
        "=".repeat(filled),
        " ".repeat(empty),
        (progress * 100.0).round() as u32
    );
    if progress >= 1.0 {
        eprintln!();
    }
}

// ============================================================================
// sRGB transfer
// ============================================================================

#[inline]
fn srgb_to_linear_single(srgb: f32) -> f32 {
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb_single(linear: f32) -> f32 {
    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.max(0.0).powf(1.0 / 2.4) - 0.055
    }
}

// ============================================================================
// Driver
// ============================================================================

fn target_dims(src_w: usize, src_h: usize, width: Option<u32>, height: Option<u32>) -> (usize, usize) {
    match (width, height) {
        (Some(w), Some(h)) => (w as usize, h as usize),
        (Some(w), None) => {
            let h = (w as f64 * src_h as f64 / src_w as f64).round() as usize;
            (w as usize, h.max(1))
        }
        (None, Some(h)) => {
            let w = (h as f64 * src_w as f64 / src_h as f64).round() as usize;
            (w.max(1), h as usize)
        }
        (None, None) => (src_w, src_h),
    }
}

fn run(args: Args) -> Result<(), String> {
    if args.list_filters {
        for i in 0..filter_count() {
            println!("{}", filter_name(i).expect("registry index in range"));
        }
        return Ok(());
    }

    let input = args.input.as_ref().ok_or("no input image given")?;
    let output = args.output.as_ref().ok_or("no output path given")?;

    let img = image::open(input).map_err(|e| format!("cannot open {}: {}", input.display(), e))?;
    let rgba = img.to_rgba8();
    let (src_w, src_h) = (rgba.width() as usize, rgba.height() as usize);
    let (dst_w, dst_h) = target_dims(src_w, src_h, args.width, args.height);

    let base = Params {
        boundary: args.edge.to_boundary(),
        sample_low: 0.0,
        sample_high: 1.0,
        filter_name: args.filter.clone(),
        filter_x_scale: args.filter_scale,
        filter_y_scale: args.filter_scale,
        ..Params::default()
    };

    let first = Resampler::new(src_w, src_h, dst_w, dst_h, &base);
    match first.status() {
        Status::Okay => {}
        Status::BadFilterName => {
            return Err(format!(
                "unknown filter {:?} (try --list-filters)",
                args.filter.as_deref().unwrap_or_default()
            ))
        }
        status => return Err(format!("engine setup failed: {:?}", status)),
    }

    // One engine per channel; the siblings reuse the first engine's tables
    // instead of rebuilding them.
    let (cx, cy) = first.clists();
    let mut engines = vec![first];
    for _ in 1..4 {
        let eng = Resampler::new(
            src_w,
            src_h,
            dst_w,
            dst_h,
            &Params {
                clist_x: Some(cx.clone()),
                clist_y: Some(cy.clone()),
                ..base.clone()
            },
        );
        if eng.status() != Status::Okay {
            return Err(format!("engine setup failed: {:?}", eng.status()));
        }
        engines.push(eng);
    }

    let to_linear = !args.no_linear;
    let mut out: Vec<u8> = Vec::with_capacity(dst_w * dst_h * 4);
    let mut planes: [Vec<f32>; 4] = [
        vec![0.0; src_w],
        vec![0.0; src_w],
        vec![0.0; src_w],
        vec![0.0; src_w],
    ];

    let drain = |engines: &mut [Resampler], out: &mut Vec<u8>| -> Result<(), String> {
        loop {
            let mut lines: Vec<Vec<f32>> = Vec::with_capacity(4);
            for eng in engines.iter_mut() {
                match eng.get_line() {
                    Scanline::Line(line) => lines.push(line.to_vec()),
                    Scanline::NotReady | Scanline::End => break,
                }
            }
            if lines.len() < 4 {
                // Lockstep engines agree; a partial set means no full output
                // row is ready yet.
                return Ok(());
            }
            for x in 0..dst_w {
                for (c, line) in lines.iter().enumerate() {
                    let v = if to_linear && c < 3 {
                        linear_to_srgb_single(line[x])
                    } else {
                        line[x]
                    };
                    out.push((v * 255.0 + 0.5).clamp(0.0, 255.0) as u8);
                }
            }
        }
    };

    for y in 0..src_h {
        for x in 0..src_w {
            let p = rgba.get_pixel(x as u32, y as u32).0;
            for c in 0..3 {
                let v = p[c] as f32 / 255.0;
                planes[c][x] = if to_linear { srgb_to_linear_single(v) } else { v };
            }
            planes[3][x] = p[3] as f32 / 255.0;
        }
        for (eng, plane) in engines.iter_mut().zip(&planes) {
            if !eng.put_line(plane) {
                return Err(format!("put_line failed at row {}: {:?}", y, eng.status()));
            }
        }
        drain(&mut engines, &mut out)?;
        print_progress("rescale", (y + 1) as f32 / src_h as f32);
    }
    drain(&mut engines, &mut out)?;

    if out.len() != dst_w * dst_h * 4 {
        return Err(format!(
            "engine produced {} of {} output rows",
            out.len() / (dst_w * 4),
            dst_h
        ));
    }

    let buf: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(dst_w as u32, dst_h as u32, out).ok_or("output buffer size mismatch")?;
    buf.save(output)
        .map_err(|e| format!("cannot write {}: {}", output.display(), e))?;

    eprintln!("{} -> {} ({}x{} -> {}x{})", input.display(), output.display(), src_w, src_h, dst_w, dst_h);
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
