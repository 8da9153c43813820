//! CSS colour parsing for export backends.
//!
//! Layers carry colours as CSS strings. The live surface hands them to SVG
//! unchanged; the document and deck writers need concrete channels.

/// An sRGB colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red, used for placeholders.
    pub const RED: Self = Self::rgb(255, 0, 0);

    /// An opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS colour: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb()`/`rgba()` or a basic named colour.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_args(args);
        }
        named(&lower)
    }

    /// Parse, falling back to `default` and logging the bad value.
    #[must_use]
    pub fn parse_or(input: &str, default: Self) -> Self {
        Self::parse(input).unwrap_or_else(|| {
            tracing::debug!("Unparseable colour {input:?}, using fallback");
            default
        })
    }

    /// Channels as `[0, 1]` floats for PDF operators.
    #[must_use]
    pub fn unit_rgb(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// Alpha as a `[0, 1]` float.
    #[must_use]
    pub fn alpha(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Whether the colour paints nothing.
    #[must_use]
    pub fn is_invisible(self) -> bool {
        self.a == 0
    }

    /// Composite over an opaque `base`, giving an opaque colour.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn flatten_on(self, base: Self) -> Self {
        let a = self.alpha();
        let mix = |top: u8, bottom: u8| {
            (f32::from(top) * a + f32::from(bottom) * (1.0 - a))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::rgb(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b))
    }

    /// Upper-case `RRGGBB` as used by DrawingML.
    #[must_use]
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba {
            a: nibble(3)?,
            ..Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)
        }),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            a: byte(6)?,
            ..Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)
        }),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        let v = if let Some(pct) = p.strip_suffix('%') {
            pct.parse::<f32>().ok()? / 100.0 * 255.0
        } else {
            p.parse::<f32>().ok()?
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            let v = if let Some(pct) = p.strip_suffix('%') {
                pct.parse::<f32>().ok()? / 100.0
            } else {
                p.parse::<f32>().ok()?
            };
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

fn named(name: &str) -> Option<Rgba> {
    let rgba = match name {
        "black" => Rgba::BLACK,
        "white" => Rgba::WHITE,
        "red" => Rgba::RED,
        "green" => Rgba::rgb(0, 128, 0),
        "lime" => Rgba::rgb(0, 255, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "cyan" | "aqua" => Rgba::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Rgba::rgb(255, 0, 255),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "silver" => Rgba::rgb(192, 192, 192),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "navy" => Rgba::rgb(0, 0, 128),
        "teal" => Rgba::rgb(0, 128, 128),
        "maroon" => Rgba::rgb(128, 0, 0),
        "transparent" => Rgba { a: 0, ..Rgba::BLACK },
        _ => return None,
    };
    Some(rgba)
}
