//! Region rasterization.
//!
//! [`PageRenderer`] is the seam the image extractor renders through.
//! [`WireframeRenderer`] is the built-in implementation: layout sources
//! carry no glyph outlines, so it paints every text line as a filled bar
//! and every rule segment as a stroked line, which is enough to eyeball the
//! crop of a detected table region.

use tabcrop_layout_models::{BBox, Granularity, PageLayout, RasterImage, Rgb};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::LayoutError;

/// Page space is measured in points.
const POINTS_PER_INCH: f32 = 72.0;

/// Renders a rectangular region of a page to pixels.
pub trait PageRenderer {
    /// Rasterizes `rect` of `page` at `dpi`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Render`] if the pixel buffer cannot be
    /// allocated.
    fn render(&self, page: &PageLayout, rect: &BBox, dpi: u32) -> Result<RasterImage, LayoutError>;
}

/// Paints text lines as bars and rule segments as lines on white.
#[derive(Debug, Clone)]
pub struct WireframeRenderer {
    /// Fill color for text-line bars.
    pub text_color: Rgb,
    /// Stroke color for rule segments without their own color.
    pub rule_color: Rgb,
    /// Fraction of each text line's height covered by its bar.
    pub bar_fraction: f64,
}

impl Default for WireframeRenderer {
    fn default() -> Self {
        Self {
            text_color: Rgb::new(0.55, 0.55, 0.55),
            rule_color: Rgb::new(0.0, 0.0, 0.0),
            bar_fraction: 0.6,
        }
    }
}

impl PageRenderer for WireframeRenderer {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn render(&self, page: &PageLayout, rect: &BBox, dpi: u32) -> Result<RasterImage, LayoutError> {
        let scale = dpi as f32 / POINTS_PER_INCH;
        let width = ((rect.width() as f32) * scale).ceil().max(1.0) as u32;
        let height = ((rect.height() as f32) * scale).ceil().max(1.0) as u32;

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            LayoutError::Render(format!("failed to allocate {width}x{height} pixmap"))
        })?;
        pixmap.fill(Color::WHITE);

        let transform = Transform::from_translate(-rect.left as f32, -rect.top as f32)
            .post_scale(scale, scale);

        let mut paint = Paint::default();
        paint.set_color(to_color(self.text_color));

        let inset = (1.0 - self.bar_fraction.clamp(0.0, 1.0)) / 2.0;
        for fragment in page.fragments(Granularity::Line).iter() {
            if fragment.is_blank() || !fragment.bbox.intersects(rect) {
                continue;
            }
            let b = &fragment.bbox;
            let pad = b.height() * inset;
            if let Some(bar) = Rect::from_ltrb(
                b.left as f32,
                (b.top + pad) as f32,
                b.right as f32,
                (b.bottom - pad) as f32,
            ) {
                pixmap.fill_rect(bar, &paint, transform, None);
            }
        }

        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        for rule in page.rules() {
            let mut builder = PathBuilder::new();
            builder.move_to(rule.start.x as f32, rule.start.y as f32);
            builder.line_to(rule.end.x as f32, rule.end.y as f32);
            let Some(path) = builder.finish() else {
                continue;
            };
            paint.set_color(to_color(rule.stroke.unwrap_or(self.rule_color)));
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }

        log::debug!("Rendered {width}x{height} region at {dpi} dpi");

        Ok(RasterImage {
            width,
            height,
            dpi,
            pixels: pixmap.take(),
        })
    }
}

fn to_color(c: Rgb) -> Color {
    Color::from_rgba(c.r.clamp(0.0, 1.0), c.g.clamp(0.0, 1.0), c.b.clamp(0.0, 1.0), 1.0)
        .unwrap_or(Color::BLACK)
}

#[cfg(test)]
mod tests {
    use tabcrop_layout_models::{Point, RuleSegment};

    use super::*;

    fn pixel(image: &RasterImage, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * image.width + x) * 4) as usize;
        [
            image.pixels[i],
            image.pixels[i + 1],
            image.pixels[i + 2],
            image.pixels[i + 3],
        ]
    }

    #[test]
    fn region_size_scales_with_dpi() {
        let page = PageLayout::new(612.0, 792.0);
        let image = WireframeRenderer::default()
            .render(&page, &BBox::new(0.0, 100.0, 612.0, 172.0), 144)
            .unwrap();
        assert_eq!(image.width, 1224);
        assert_eq!(image.height, 144);
        assert_eq!(image.dpi, 144);
        assert_eq!(image.pixels.len(), 1224 * 144 * 4);
        assert_eq!(pixel(&image, 10, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn paints_text_bars_and_rules_inside_region() {
        let page = PageLayout::new(200.0, 200.0)
            .with_block(BBox::new(10.0, 10.0, 100.0, 30.0), "DATE")
            .with_rule(RuleSegment::new(
                Point::new(0.0, 50.5),
                Point::new(200.0, 50.5),
                Some(Rgb::new(0.0, 0.0, 1.0)),
            ));
        let image = WireframeRenderer::default()
            .render(&page, &page.bbox(), 72)
            .unwrap();

        assert_ne!(pixel(&image, 50, 20), [255, 255, 255, 255]);
        assert_eq!(pixel(&image, 150, 20), [255, 255, 255, 255]);
        let rule = pixel(&image, 100, 50);
        assert!(rule[2] > rule[0]);
    }
}
