pub use kurbo::{Point, Rect, Size, Vec2};

/// Integer point in content space (pixels).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntPoint {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl IntPoint {
    /// Origin `(0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)` using saturating arithmetic.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Integer size in pixels. Negative extents are treated as empty.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntSize {
    /// Create a size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either extent is zero or negative.
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Pixel count, zero for empty sizes.
    pub fn area(self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.width as u64) * (self.height as u64)
    }

    /// Scale by `scale`, rounding up so the result covers every partially touched pixel.
    pub fn scale_ceil(self, scale: f64) -> Self {
        let s = Size::new(f64::from(self.width), f64::from(self.height)) * scale;
        let s = s.ceil();
        Self {
            width: s.width.clamp(0.0, f64::from(i32::MAX)) as i32,
            height: s.height.clamp(0.0, f64::from(i32::MAX)) as i32,
        }
    }
}

/// Axis-aligned integer rectangle, half-open: `[x, x + width) x [y, y + height)`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntRect {
    /// Create a rectangle from origin and extent.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at `origin` with extent `size`.
    pub const fn from_origin_size(origin: IntPoint, size: IntSize) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Create from edges; inverted edges produce an empty rectangle.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, (right - left).max(0), (bottom - top).max(0))
    }

    /// Rectangle at the origin covering `size`.
    pub const fn from_size(size: IntSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Top-left corner.
    pub fn origin(self) -> IntPoint {
        IntPoint::new(self.x, self.y)
    }

    /// Extent.
    pub fn size(self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Pixel count, zero for empty rectangles.
    pub fn area(self) -> u64 {
        self.size().area()
    }

    /// Return `true` when `p` lies inside the rectangle.
    pub fn contains_point(self, p: IntPoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Return `true` when `other` lies entirely inside `self`. Empty rectangles are contained
    /// everywhere.
    pub fn contains_rect(self, other: IntRect) -> bool {
        if other.is_empty() {
            return true;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection; empty (at the origin of `self`) when the rectangles do not overlap.
    pub fn intersect(self, other: IntRect) -> IntRect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return IntRect::new(self.x, self.y, 0, 0);
        }
        IntRect::from_edges(left, top, right, bottom)
    }

    /// Return `true` when the rectangles share at least one pixel.
    pub fn intersects(self, other: IntRect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both. Empty inputs are ignored.
    pub fn union(self, other: IntRect) -> IntRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        IntRect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Move by `(dx, dy)`.
    pub fn translate(self, dx: i32, dy: i32) -> IntRect {
        IntRect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Grow (or shrink, for negative values) every edge by the given amounts.
    pub fn inflate(self, dx: i32, dy: i32) -> IntRect {
        IntRect::from_edges(
            self.x - dx,
            self.y - dy,
            self.right() + dx,
            self.bottom() + dy,
        )
    }

    /// Convert to a floating-point `kurbo` rectangle.
    pub fn to_kurbo(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Smallest integer rectangle covering `r`.
    pub fn round_out(r: Rect) -> IntRect {
        let r = r.abs().expand();
        let clamp = |v: f64| v.clamp(f64::from(i32::MIN / 2), f64::from(i32::MAX / 2)) as i32;
        IntRect::from_edges(clamp(r.x0), clamp(r.y0), clamp(r.x1), clamp(r.y1))
    }

    /// Scale about the origin and round outwards.
    pub fn scale_round_out(self, scale: f64) -> IntRect {
        Self::round_out(self.to_kurbo().scale_from_origin(scale))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Opaque white.
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Byte layout used by pixel buffers.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba8Premul {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
