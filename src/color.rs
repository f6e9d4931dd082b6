use image::Rgb;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Plot colours
// ---------------------------------------------------------------------------

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const AXES: Rgb<u8> = Rgb([0, 0, 0]);
/// First colour of matplotlib's default cycle.
pub const BAR_FILL: Rgb<u8> = Rgb([0x1f, 0x77, 0xb4]);

/// Bar outline: the fill colour with lightness reduced by `amount` (0..1).
pub fn darken(color: Rgb<u8>, amount: f32) -> Rgb<u8> {
    let [r, g, b] = color.0;
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let mut hsl: Hsl = rgb.into_color();
    hsl.lightness = (hsl.lightness - amount).clamp(0.0, 1.0);
    to_rgb(hsl)
}

/// Blend `color` toward white, for grid lines.
pub fn lighten(color: Rgb<u8>, amount: f32) -> Rgb<u8> {
    let [r, g, b] = color.0;
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let mut hsl: Hsl = rgb.into_color();
    hsl.lightness = (hsl.lightness + amount).clamp(0.0, 1.0);
    to_rgb(hsl)
}

fn to_rgb(hsl: Hsl) -> Rgb<u8> {
    let rgb: Srgb = hsl.into_color();
    Rgb([
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luma(c: Rgb<u8>) -> u32 {
        c.0.iter().map(|&v| v as u32).sum()
    }

    #[test]
    fn darken_and_lighten_move_lightness() {
        assert!(luma(darken(BAR_FILL, 0.2)) < luma(BAR_FILL));
        assert!(luma(lighten(AXES, 0.9)) > luma(AXES));
        assert_eq!(darken(AXES, 0.5), AXES);
    }
}
