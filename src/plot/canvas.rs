use image::{Rgb, RgbImage};

// ---------------------------------------------------------------------------
// Canvas – clipped drawing primitives over an RgbImage
// ---------------------------------------------------------------------------

/// A raster surface owned by exactly one plot.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Canvas {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> i64 {
        self.image.width() as i64
    }

    pub fn height(&self) -> i64 {
        self.image.height() as i64
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < self.width() && y < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fill the half-open rectangle `[x0, x1) × [y0, y1)`; corners may come in any order.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        let (xa, xb) = (x0.min(x1).max(0), x0.max(x1).min(self.width()));
        let (ya, yb) = (y0.min(y1).max(0), y0.max(y1).min(self.height()));
        for y in ya..yb {
            for x in xa..xb {
                self.put(x, y, color);
            }
        }
    }

    pub fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
        self.fill_rect(x0, y, x1 + 1, y + 1, color);
    }

    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
        self.fill_rect(x, y0, x + 1, y1 + 1, color);
    }

    /// One-pixel outline whose corners are both inside the outline.
    pub fn stroke_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        let (xa, xb) = (x0.min(x1), x0.max(x1));
        let (ya, yb) = (y0.min(y1), y0.max(y1));
        self.hline(xa, xb, ya, color);
        self.hline(xa, xb, yb, color);
        self.vline(xa, ya, yb, color);
        self.vline(xb, ya, yb, color);
    }

    /// Draw `text` with its top-left corner at (x, y). Characters without a
    /// glyph are left blank.
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, scale: i64, color: Rgb<u8>) {
        let mut cursor = x;
        for c in text.chars() {
            if let Some(rows) = glyph(c) {
                for (dy, bits) in rows.iter().enumerate() {
                    for dx in 0..GLYPH_WIDTH {
                        if bits & (1 << (GLYPH_WIDTH - 1 - dx)) != 0 {
                            let px = cursor + dx * scale;
                            let py = y + dy as i64 * scale;
                            self.fill_rect(px, py, px + scale, py + scale, color);
                        }
                    }
                }
            }
            cursor += (GLYPH_WIDTH + 1) * scale;
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

// ---------------------------------------------------------------------------
// 3×5 bitmap font for tick labels
// ---------------------------------------------------------------------------

pub const GLYPH_WIDTH: i64 = 3;
pub const GLYPH_HEIGHT: i64 = 5;

/// Width in pixels of `text` drawn at `scale`, without trailing spacing.
pub fn text_width(text: &str, scale: i64) -> i64 {
    let n = text.chars().count() as i64;
    if n == 0 {
        0
    } else {
        (n * (GLYPH_WIDTH + 1) - 1) * scale
    }
}

fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        'e' => [0b000, 0b011, 0b111, 0b100, 0b011],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn fill_is_clipped_to_the_image() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        canvas.fill_rect(-5, 2, 10, 10, RED);
        let image = canvas.into_image();
        assert_eq!(*image.get_pixel(0, 1), WHITE);
        assert_eq!(*image.get_pixel(0, 2), RED);
        assert_eq!(*image.get_pixel(3, 3), RED);
    }

    #[test]
    fn text_draws_known_glyphs() {
        let mut canvas = Canvas::new(20, 10, WHITE);
        canvas.draw_text(0, 0, "1", 1, RED);
        let image = canvas.into_image();
        // top row of '1' is 0b010
        assert_eq!(*image.get_pixel(0, 0), WHITE);
        assert_eq!(*image.get_pixel(1, 0), RED);
        assert_eq!(text_width("-1.5", 2), (4 * 4 - 1) * 2);
        assert_eq!(text_width("", 2), 0);
    }
}
