//! Color helpers: hex and HSL construction, opacity blending, terminal conversion.
//!
//! Channels are floats in [0.0, 1.0]. Hue is expressed as a fraction of the
//! color wheel (0.0 = red, 1/3 = green, 2/3 = blue), not in degrees.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// HSL to RGB. Hue wraps; saturation and lightness are clamped.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 {
            return Self::new(l, l, l);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self {
            r: hue_to_channel(p, q, h + 1.0 / 3.0),
            g: hue_to_channel(p, q, h),
            b: hue_to_channel(p, q, h - 1.0 / 3.0),
        }
    }

    /// Composite this color over `background` at the given opacity.
    pub fn over(self, background: Rgb, opacity: f32) -> Rgb {
        let a = opacity.clamp(0.0, 1.0);
        Rgb {
            r: background.r + (self.r - background.r) * a,
            g: background.g + (self.g - background.g) * a,
            b: background.b + (self.b - background.b) * a,
        }
    }

    pub fn to_color(self) -> Color {
        Color::Rgb(to_byte(self.r), to_byte(self.g), to_byte(self.b))
    }
}

fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}
