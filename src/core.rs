pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// One vertex of a shape outline.
///
/// Coordinates are shape-local, normalized to [-1, 1] on both axes. Node
/// order is significant: it defines polygon winding and which neighbors a
/// path interpolation uses. Ids must be unique within a list.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Straight (non-premultiplied) RGBA8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    /// Malformed input falls back to opaque black rather than erroring, so
    /// persisted configs with garbage color strings still render.
    pub fn from_hex(hex: &str) -> Self {
        let s = hex.trim().trim_start_matches('#');
        let nibble = |c: u8| -> Option<u8> { (c as char).to_digit(16).map(|d| d as u8) };
        let byte = |hi: u8, lo: u8| -> Option<u8> { Some(nibble(hi)? << 4 | nibble(lo)?) };

        let b = s.as_bytes();
        let parsed = match b.len() {
            3 => (|| {
                let r = nibble(b[0])?;
                let g = nibble(b[1])?;
                let bl = nibble(b[2])?;
                Some(Self::rgb(r << 4 | r, g << 4 | g, bl << 4 | bl))
            })(),
            6 => (|| Some(Self::rgb(byte(b[0], b[1])?, byte(b[2], b[3])?, byte(b[4], b[5])?)))(),
            8 => (|| {
                Some(Self {
                    r: byte(b[0], b[1])?,
                    g: byte(b[2], b[3])?,
                    b: byte(b[4], b[5])?,
                    a: byte(b[6], b[7])?,
                })
            })(),
            _ => None,
        };
        parsed.unwrap_or(Self::BLACK)
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}
