// src/charts/pie.rs
use std::f64::consts::PI;

use image::RgbaImage;

use super::font::{draw_text_centered, text_height};
use super::{encode_png, ChartError, Png, BLUE, GRID, INK, ORANGE, WHITE};

const W: u32 = 480;
const H: u32 = 400;
const RADIUS: f64 = 140.0;
const START_DEG: f64 = 90.0;

/// Two-slice pie: `brand_label` = `mentions`, "Others" = `total - mentions`.
/// Slices start at 12 o'clock and run counter-clockwise, labelled with their
/// share to one decimal. An empty result set draws an outlined "No data" disc.
pub fn render_pie(brand_label: &str, mentions: usize, total: usize) -> Result<Png, ChartError> {
    let mut img = RgbaImage::from_pixel(W, H, WHITE);
    let (cx, cy) = (W as f64 / 2.0, H as f64 / 2.0);

    if total == 0 {
        draw_ring(&mut img, cx, cy);
        draw_text_centered(&mut img, cx as i64, cy as i64 - 7, "No data", 2, INK);
        return encode_png(img);
    }

    let mentions = mentions.min(total);
    let slices = [
        (brand_label, mentions as f64 / total as f64, BLUE),
        ("Others", (total - mentions) as f64 / total as f64, ORANGE),
    ];

    for y in 0..H {
        for x in 0..W {
            let dx = x as f64 + 0.5 - cx;
            let dy = cy - (y as f64 + 0.5); // y grows upward
            if dx * dx + dy * dy > RADIUS * RADIUS {
                continue;
            }
            let frac = ccw_fraction(dx, dy);
            let mut acc = 0.0;
            for (_, share, color) in slices.iter() {
                acc += share;
                if frac < acc || (acc >= 1.0 - 1e-12) {
                    img.put_pixel(x, y, *color);
                    break;
                }
            }
        }
    }

    // labels: name just outside the rim, percentage inside the slice
    let mut start = 0.0;
    for (label, share, _) in slices.iter() {
        if *share <= 0.0 {
            continue;
        }
        let mid = START_DEG + (start + share / 2.0) * 360.0;
        let (ux, uy) = (mid.to_radians().cos(), mid.to_radians().sin());

        let name_r = RADIUS * 1.18;
        let (nx, ny) = (cx + ux * name_r, cy - uy * name_r);
        draw_text_centered(&mut img, nx as i64, ny as i64 - 7, label, 2, INK);

        let pct_r = if *share >= 0.999 { 0.0 } else { RADIUS * 0.6 };
        let (px, py) = (cx + ux * pct_r, cy - uy * pct_r);
        let pct = format!("{:.1}%", share * 100.0);
        draw_text_centered(
            &mut img,
            px as i64,
            py as i64 - (text_height(2) / 2) as i64,
            &pct,
            2,
            WHITE,
        );
        start += share;
    }

    encode_png(img)
}

/// Fraction of a full turn from the 12 o'clock start, counter-clockwise, in [0, 1).
fn ccw_fraction(dx: f64, dy: f64) -> f64 {
    let deg = dy.atan2(dx) * 180.0 / PI;
    (deg - START_DEG).rem_euclid(360.0) / 360.0
}

fn draw_ring(img: &mut RgbaImage, cx: f64, cy: f64) {
    for y in 0..H {
        for x in 0..W {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if (RADIUS - 2.0..=RADIUS).contains(&d) {
                img.put_pixel(x, y, GRID);
            }
        }
    }
}
