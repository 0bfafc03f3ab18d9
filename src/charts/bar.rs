// src/charts/bar.rs
use image::{imageops, RgbaImage};

use super::font::{draw_text, draw_text_centered, text_image, text_width};
use super::{encode_png, fill_rect, hline, vline, ChartError, Png, GRID, INK, SKYBLUE, WHITE};

const MIN_W: u32 = 480;
const H: u32 = 460;
const LEFT: u32 = 70;
const RIGHT: u32 = 20;
const TOP: u32 = 50;
const BOTTOM: u32 = 150;
const MIN_SLOT: u32 = 36;
const MAX_LABEL_CHARS: usize = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub label: String,
    pub value: f64,
}

struct Layout {
    width: u32,
    slot: u32,
    zero_y: i64,
    half_h: f64,
    limit: f64,
}

impl Layout {
    fn new(data: &[BarDatum]) -> Self {
        let n = data.len().max(1) as u32;
        let slot = MIN_SLOT.max((MIN_W - LEFT - RIGHT) / n);
        let width = LEFT + slot * n + RIGHT;
        let plot_h = H - TOP - BOTTOM;

        // symmetric y range rounded up to a tenth, so the zero line sits mid-plot
        let peak = data.iter().map(|d| d.value.abs()).fold(0.0_f64, f64::max);
        let limit = ((peak * 10.0).ceil() / 10.0).clamp(0.1, 1.0);

        Self {
            width,
            slot,
            zero_y: (TOP + plot_h / 2) as i64,
            half_h: (plot_h / 2) as f64,
            limit,
        }
    }

    fn y_of(&self, v: f64) -> i64 {
        let v = v.clamp(-self.limit, self.limit);
        self.zero_y - (v / self.limit * self.half_h).round() as i64
    }

    fn slot_x(&self, i: usize) -> i64 {
        (LEFT + self.slot * i as u32) as i64
    }

    fn plot_bottom(&self) -> i64 {
        (H - BOTTOM) as i64
    }
}

/// One bar per datum, keyed by label, height = signed value on a zero baseline.
/// Labels are rotated a quarter turn so long channel names stay readable.
/// They go through the 5x7 ASCII font: lower case is drawn upper case and
/// anything outside ASCII becomes '?', so non-Latin channel names are not
/// distinguishable on the chart. The JSON and CSV keep the exact names.
pub fn render_bar(data: &[BarDatum]) -> Result<Png, ChartError> {
    let layout = Layout::new(data);
    let mut img = RgbaImage::from_pixel(layout.width, H, WHITE);
    let plot_right = (layout.width - RIGHT) as i64;

    // y ticks + grid
    for step in [1.0, 0.5, 0.0, -0.5, -1.0] {
        let v = layout.limit * step;
        let y = layout.y_of(v);
        hline(&mut img, LEFT as i64, plot_right, y, GRID);
        let label = format!("{v:.2}");
        let w = text_width(&label, 1) as i64;
        draw_text(&mut img, LEFT as i64 - 6 - w, y - 3, &label, 1, INK);
    }

    for (i, d) in data.iter().enumerate() {
        let x0 = layout.slot_x(i);
        let pad = (layout.slot / 6) as i64;
        let top = layout.y_of(d.value);
        fill_rect(
            &mut img,
            x0 + pad,
            layout.zero_y,
            x0 + layout.slot as i64 - pad,
            top,
            SKYBLUE,
        );

        let label: String = d.label.chars().take(MAX_LABEL_CHARS).collect();
        let rotated = imageops::rotate270(&text_image(&label, 1, INK));
        let cx = x0 + (layout.slot / 2) as i64;
        imageops::overlay(
            &mut img,
            &rotated,
            cx - (rotated.width() / 2) as i64,
            layout.plot_bottom() + 6,
        );
    }

    // axes on top of the bars
    hline(&mut img, LEFT as i64, plot_right, layout.zero_y, INK);
    vline(&mut img, LEFT as i64, TOP as i64, layout.plot_bottom(), INK);

    let cx = (layout.width / 2) as i64;
    draw_text_centered(&mut img, cx, 16, "Sentiment Analysis of Top Videos", 2, INK);
    draw_text_centered(&mut img, cx, (H - 22) as i64, "Channels", 2, INK);
    let y_title = imageops::rotate270(&text_image("Sentiment Score", 1, INK));
    let y_top = layout.zero_y - (y_title.height() / 2) as i64;
    imageops::overlay(&mut img, &y_title, 8, y_top);

    encode_png(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &Png) -> RgbaImage {
        image::load_from_memory(png.as_bytes()).unwrap().to_rgba8()
    }

    fn datum(label: &str, value: f64) -> BarDatum {
        BarDatum {
            label: label.into(),
            value,
        }
    }

    #[test]
    fn bars_grow_up_for_positive_and_down_for_negative() {
        let data = vec![datum("Tech Guru", 0.8), datum("Fan Reviews", -0.4)];
        let layout = Layout::new(&data);
        let img = decode(&render_bar(&data).unwrap());

        let mid0 = (layout.slot_x(0) + layout.slot as i64 / 2) as u32;
        let mid1 = (layout.slot_x(1) + layout.slot as i64 / 2) as u32;
        assert_eq!(*img.get_pixel(mid0, (layout.zero_y - 20) as u32), SKYBLUE);
        assert_eq!(*img.get_pixel(mid0, (layout.zero_y + 20) as u32), WHITE);
        assert_eq!(*img.get_pixel(mid1, (layout.zero_y + 20) as u32), SKYBLUE);
        assert_eq!(*img.get_pixel(mid1, (layout.zero_y - 20) as u32), WHITE);
    }

    #[test]
    fn y_range_is_rounded_and_bounded() {
        assert_eq!(Layout::new(&[datum("a", 0.0)]).limit, 0.1);
        assert_eq!(Layout::new(&[datum("a", -0.34)]).limit, 0.4);
        assert_eq!(Layout::new(&[datum("a", 3.0)]).limit, 1.0);
    }

    #[test]
    fn canvas_widens_with_many_channels() {
        let many: Vec<BarDatum> = (0..40).map(|i| datum(&format!("c{i}"), 0.1)).collect();
        let img = decode(&render_bar(&many).unwrap());
        assert_eq!(img.width(), LEFT + MIN_SLOT * 40 + RIGHT);

        let empty = decode(&render_bar(&[]).unwrap());
        assert_eq!(empty.height(), H);
    }
}
