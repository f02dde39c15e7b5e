//! PNG snapshot export
//!
//! Rasterizes a polygon layer into an RGB image with even-odd scanline
//! fill over a dark ocean background, using the same Mercator projection
//! as the interactive view.

use std::collections::HashMap;
use std::error::Error;

use chrono::Local;
use image::{Rgb, RgbImage};

use crate::geometry::{mercator, PolygonLayer};
use crate::palette::{Rgb8, BASE_FILL};

/// Background color for areas with no polygon.
const OCEAN: Rgb<u8> = Rgb([18, 40, 74]);

/// Fraction of the image left as margin around the layer bounds.
const MARGIN: f64 = 0.03;

struct PixelShape {
    rings: Vec<Vec<(f64, f64)>>,
    fill: Rgb<u8>,
}

/// Render a layer to an image. Fills are looked up by shape id; shapes
/// without an entry use the neutral base fill.
pub fn render_layer(
    layer: &PolygonLayer,
    fills: &HashMap<String, Rgb8>,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, OCEAN);

    let Some((min_x, min_y, max_x, max_y)) = layer.projected_bounds() else {
        return img;
    };

    // Aspect-preserving fit with a small margin
    let span_x = (max_x - min_x).max(1e-9);
    let span_y = (max_y - min_y).max(1e-9);
    let usable_w = width as f64 * (1.0 - 2.0 * MARGIN);
    let usable_h = height as f64 * (1.0 - 2.0 * MARGIN);
    let scale = (usable_w / span_x).min(usable_h / span_y);
    let offset_x = (width as f64 - span_x * scale) / 2.0;
    let offset_y = (height as f64 - span_y * scale) / 2.0;

    let to_pixel = |lon: f64, lat: f64| -> (f64, f64) {
        let (mx, my) = mercator(lon, lat);
        let px = (mx - min_x) * scale + offset_x;
        // Mercator y grows north, pixel y grows down
        let py = (max_y - my) * scale + offset_y;
        (px, py)
    };

    let shapes: Vec<PixelShape> = layer
        .shapes
        .iter()
        .map(|shape| {
            let fill = fills.get(&shape.id).copied().unwrap_or(BASE_FILL);
            let mut rings = Vec::new();
            for polygon in &shape.geometry.0 {
                let exterior = polygon.exterior().0.iter();
                rings.push(exterior.map(|c| to_pixel(c.x, c.y)).collect());
                for interior in polygon.interiors() {
                    rings.push(interior.0.iter().map(|c| to_pixel(c.x, c.y)).collect());
                }
            }
            PixelShape {
                rings,
                fill: Rgb([fill.r, fill.g, fill.b]),
            }
        })
        .collect();

    for y in 0..height {
        let yc = y as f64 + 0.5;
        for shape in &shapes {
            let mut xs: Vec<f64> = Vec::new();
            for ring in &shape.rings {
                if ring.len() < 2 {
                    continue;
                }
                for i in 0..ring.len() {
                    let (x1, y1) = ring[i];
                    let (x2, y2) = ring[(i + 1) % ring.len()];
                    // Half-open interval keeps shared vertices from double-counting
                    if (y1 <= yc && y2 > yc) || (y2 <= yc && y1 > yc) {
                        let t = (yc - y1) / (y2 - y1);
                        xs.push(x1 + t * (x2 - x1));
                    }
                }
            }
            xs.sort_by(f64::total_cmp);

            for pair in xs.chunks_exact(2) {
                if pair[1] < 0.0 || pair[0] > width as f64 - 1.0 {
                    continue;
                }
                let x_start = pair[0].ceil().max(0.0) as u32;
                let x_end = pair[1].floor().min(width as f64 - 1.0) as u32;
                for x in x_start..=x_end {
                    img.put_pixel(x, y, shape.fill);
                }
            }
        }
    }

    img
}

/// Render a layer and save it as a PNG.
pub fn export_layer_image(
    layer: &PolygonLayer,
    fills: &HashMap<String, Rgb8>,
    width: u32,
    height: u32,
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let img = render_layer(layer, fills, width, height);
    img.save(filename)?;
    println!("Exported map to {}", filename);
    Ok(())
}

/// Timestamped snapshot filename for interactive exports.
pub fn snapshot_filename(prefix: &str) -> String {
    format!("{}_{}.png", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}
