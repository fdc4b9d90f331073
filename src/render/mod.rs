//! Light curve chart rendering
//!
//! Draws a series as a point cloud (no connecting line) on a fixed 2:1 canvas
//! and encodes it as PNG. Each call builds its own drawing backend over a
//! private buffer, so there is no plotting state shared between requests.

use std::io::Cursor;
use std::ops::Range;

use base64::Engine;
use plotters::prelude::*;

use crate::domain::{ImageFormat, RenderedImage, Series};
use crate::errors::{ApiResult, PipelineError};

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 400;
pub const MARKER_SIZE: u32 = 2;
pub const MARKER_OPACITY: f64 = 0.8;

const MARKER_COLOR: RGBColor = RGBColor(255, 105, 180);
const FRAME_COLOR: RGBColor = RGBColor(80, 80, 80);

/// Render a series to a PNG chart
pub fn render(series: &Series) -> ApiResult<RenderedImage> {
    if series.is_empty() {
        return Err(PipelineError::Render(
            "cannot render an empty series".to_string(),
        ));
    }

    let points: Vec<(f64, f64)> = series
        .points()
        .filter(|(t, f)| t.is_finite() && f.is_finite())
        .collect();
    let (x_range, y_range) = axis_ranges(&points);

    let mut pixels = vec![0u8; (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize];
    draw_points(&mut pixels, &points, x_range, y_range)
        .map_err(|e| PipelineError::Render(e.to_string()))?;

    let bytes = encode_png(pixels)?;
    Ok(RenderedImage {
        bytes,
        format: ImageFormat::Png,
    })
}

/// Base-64 form of a rendered image for JSON and HTML embedding
pub fn to_base64(image: &RenderedImage) -> String {
    base64::engine::general_purpose::STANDARD.encode(&image.bytes)
}

fn draw_points(
    pixels: &mut [u8],
    points: &[(f64, f64)],
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root =
        BitMapBackend::with_buffer(pixels, (CANVAS_WIDTH, CANVAS_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart.draw_series(std::iter::once(Rectangle::new(
        [(x_range.start, y_range.start), (x_range.end, y_range.end)],
        FRAME_COLOR.stroke_width(1),
    )))?;

    let marker = MARKER_COLOR.mix(MARKER_OPACITY).filled();
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), MARKER_SIZE, marker)),
    )?;

    root.present()?;
    Ok(())
}

fn encode_png(pixels: Vec<u8>) -> ApiResult<Vec<u8>> {
    let img = image::RgbImage::from_raw(CANVAS_WIDTH, CANVAS_HEIGHT, pixels).ok_or_else(|| {
        PipelineError::Render("pixel buffer does not match canvas size".to_string())
    })?;

    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| PipelineError::Render(format!("failed to encode PNG: {}", e)))?;
    Ok(png_bytes)
}

/// Data bounds padded by 5%, with a unit window around degenerate ranges
fn axis_ranges(points: &[(f64, f64)]) -> (Range<f64>, Range<f64>) {
    let xs = points.iter().map(|p| p.0);
    let ys = points.iter().map(|p| p.1);
    (padded_range(xs), padded_range(ys))
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON * max.abs().max(1.0) {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = span * 0.05;
    (min - pad)..(max + pad)
}
