//! Shared geometric and color primitives used across scene, render and editor modules.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn translated(self, delta_x: f32, delta_y: f32) -> Self {
        Self::new(self.x + delta_x, self.y + delta_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectScale {
    pub x: f32,
    pub y: f32,
}

impl ObjectScale {
    pub const IDENTITY: Self = Self::uniform(1.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn uniform(factor: f32) -> Self {
        Self {
            x: factor,
            y: factor,
        }
    }

    pub fn is_valid(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }
}

impl Default for ObjectScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ObjectBounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: CanvasPoint) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

/// Uniform scale and top-left offset that fit `natural` inside `canvas` without cropping.
pub fn fit_contain(
    canvas: CanvasSize,
    natural_width: u32,
    natural_height: u32,
) -> (f32, CanvasPoint) {
    let canvas_width = canvas.width as f32;
    let canvas_height = canvas.height as f32;
    let natural_width = natural_width.max(1) as f32;
    let natural_height = natural_height.max(1) as f32;

    let scale = (canvas_width / natural_width).min(canvas_height / natural_height);
    let left = (canvas_width - natural_width * scale) / 2.0;
    let top = (canvas_height - natural_height * scale) / 2.0;
    (scale, CanvasPoint::new(left, top))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or `rgba(r, g, b, a)` with `a` in `0..=1`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        let inner = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts = inner.split(',').map(str::trim).collect::<Vec<_>>();
        match parts.as_slice() {
            [r, g, b] => Some(Self::new(channel(r)?, channel(g)?, channel(b)?)),
            [r, g, b, a] => {
                let alpha = a.parse::<f32>().ok().filter(|a| a.is_finite())?;
                let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
                Some(Self::with_alpha(channel(r)?, channel(g)?, channel(b)?, alpha))
            }
            _ => None,
        }
    }
}

fn channel(part: &str) -> Option<u8> {
    part.parse::<u8>().ok()
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |index: usize| u8::from_str_radix(hex.get(index..index + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let mut channels = [0_u8; 3];
            for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                let nibble = u8::try_from(digit.to_digit(16)?).ok()?;
                *slot = nibble * 17;
            }
            Some(Color::new(channels[0], channels[1], channels[2]))
        }
        6 => Some(Color::new(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::with_alpha(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}
