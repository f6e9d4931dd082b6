//! Histogram rendering to PNG.
//!
//! Every call builds its own [`canvas::Canvas`], so nothing drawn for one
//! column can leak into the next.

pub mod canvas;
pub mod histogram;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use log::{debug, info};

use crate::color::{darken, lighten, AXES, BACKGROUND, BAR_FILL};
use crate::data::model::StructuredArray;
use canvas::{text_width, Canvas, GLYPH_HEIGHT};
use histogram::{nice_ticks, tick_label, Histogram};

const TICK_LEN: i64 = 4;
const TEXT_SCALE: i64 = 2;

/// Rendering settings; the defaults match a 6.4 × 4.8 in figure at 100 dpi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramOptions {
    pub bins: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        HistogramOptions {
            bins: 10,
            width: 640,
            height: 480,
        }
    }
}

/// `alignments3D/pose_ess` → `alignments3D_pose_ess_histogram.png`
pub fn histogram_file_name(column: &str) -> String {
    let mut name: String = column
        .chars()
        .map(|c| if c == '/' || std::path::is_separator(c) { '_' } else { c })
        .collect();
    name.push_str("_histogram.png");
    name
}

/// Compute and save the histogram of one numeric column into `dir`,
/// overwriting any earlier file of the same name.
pub fn save_histogram(
    array: &StructuredArray,
    column: &str,
    dir: &Path,
    options: &HistogramOptions,
) -> Result<PathBuf> {
    let values = array.numeric_values(column)?;
    let hist = Histogram::compute(&values, options.bins);
    let (lo, hi) = hist.range();
    debug!("{column}: {} bins over [{lo}, {hi}], {} values", hist.counts.len(), hist.total());

    let path = dir.join(histogram_file_name(column));
    render(&hist, options)
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(path)
}

/// Draw bars, axes frame, ticks and tick labels onto a fresh canvas.
pub fn render(hist: &Histogram, options: &HistogramOptions) -> RgbImage {
    let mut canvas = Canvas::new(options.width, options.height, BACKGROUND);
    let (w, h) = (canvas.width() as f64, canvas.height() as f64);

    // axes placement as fractions of the figure
    let left = (w * 0.125).round() as i64;
    let right = (w * 0.9).round() as i64;
    let top = (h * 0.12).round() as i64;
    let bottom = (h * 0.89).round() as i64;

    let (lo, hi) = hist.range();
    let pad = (hi - lo) * 0.05;
    let (x_min, x_max) = (lo - pad, hi + pad);
    let y_max = hist.max_count().max(1) as f64 * 1.05;

    let x_px = |v: f64| left + ((v - x_min) / (x_max - x_min) * (right - left) as f64).round() as i64;
    let y_px = |c: f64| bottom - (c / y_max * (bottom - top) as f64).round() as i64;

    // horizontal grid behind the bars
    let grid = lighten(AXES, 0.9);
    let (y_ticks, y_step) = nice_ticks(0.0, y_max, 5);
    for &t in &y_ticks {
        if t > 0.0 {
            canvas.hline(left, right, y_px(t), grid);
        }
    }

    let outline = darken(BAR_FILL, 0.15);
    for (i, &count) in hist.counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let (x0, x1) = (x_px(hist.edges[i]), x_px(hist.edges[i + 1]));
        let y = y_px(count as f64);
        canvas.fill_rect(x0, y, x1, bottom, BAR_FILL);
        canvas.stroke_rect(x0, y, x1, bottom, outline);
    }

    canvas.stroke_rect(left, top, right, bottom, AXES);

    let label_height = GLYPH_HEIGHT * TEXT_SCALE;
    let (x_ticks, x_step) = nice_ticks(x_min, x_max, 6);
    for &t in &x_ticks {
        let x = x_px(t);
        canvas.vline(x, bottom, bottom + TICK_LEN, AXES);
        let label = tick_label(t, x_step);
        let width = text_width(&label, TEXT_SCALE);
        canvas.draw_text(x - width / 2, bottom + TICK_LEN + 4, &label, TEXT_SCALE, AXES);
    }
    for &t in &y_ticks {
        let y = y_px(t);
        canvas.hline(left - TICK_LEN, left, y, AXES);
        let label = tick_label(t, y_step);
        let width = text_width(&label, TEXT_SCALE);
        canvas.draw_text(left - TICK_LEN - 4 - width, y - label_height / 2, &label, TEXT_SCALE, AXES);
    }

    canvas.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_replaces_separators() {
        assert_eq!(
            histogram_file_name("alignments3D/pose_ess"),
            "alignments3D_pose_ess_histogram.png"
        );
        assert_eq!(histogram_file_name("uid"), "uid_histogram.png");
    }

    #[test]
    fn render_uses_requested_size_and_draws_bars() {
        let options = HistogramOptions {
            bins: 2,
            width: 200,
            height: 100,
        };
        let hist = Histogram::compute(&[0.0, 1.0, 1.0], options.bins);
        let image = render(&hist, &options);
        assert_eq!(image.dimensions(), (200, 100));
        assert!(image.pixels().any(|p| *p == BAR_FILL));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn empty_histogram_renders_without_bars() {
        let hist = Histogram::compute(&[], 10);
        let image = render(&hist, &HistogramOptions::default());
        assert!(!image.pixels().any(|p| *p == BAR_FILL));
    }
}
