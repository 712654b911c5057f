use nalgebra::Vector2;

/// 2D vector in simulation units.
pub type Vec2 = Vector2<f64>;

/// Axis-aligned box with half-open containment: a point is *in*
/// `[xmin, xmin + width) x [ymin, ymin + height)`.
///
/// The half-open convention means a point on a shared edge between two
/// adjacent boxes belongs to exactly one of them, which keeps quadtree
/// insertion unambiguous. The overlap test is non-strict on edges so a
/// query region touching a cell boundary still visits both cells.
///
/// # Examples
///
/// ```
/// use accretion::{Bounds, Vec2};
///
/// let bounds = Bounds::new(-1.0, -1.0, 2.0, 2.0);
/// assert!(bounds.contains(Vec2::new(0.0, 0.0)));
/// assert!(bounds.contains(Vec2::new(-1.0, -1.0))); // lower edge is inclusive
/// assert!(!bounds.contains(Vec2::new(1.0, 0.0)));  // upper edge is exclusive
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(xmin: f64, ymin: f64, width: f64, height: f64) -> Self {
        Self { xmin, ymin, width, height }
    }

    /// Square box of the given half-width centered on `center`.
    pub fn centered_square(center: Vec2, half_width: f64) -> Self {
        Self {
            xmin: center.x - half_width,
            ymin: center.y - half_width,
            width: 2.0 * half_width,
            height: 2.0 * half_width,
        }
    }

    pub fn left(&self) -> f64 {
        self.xmin
    }

    pub fn right(&self) -> f64 {
        self.xmin + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.ymin
    }

    pub fn top(&self) -> f64 {
        self.ymin + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.xmin + self.width / 2.0, self.ymin + self.height / 2.0)
    }

    /// Half-open containment test.
    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= self.xmin
            && position.x < self.xmin + self.width
            && position.y >= self.ymin
            && position.y < self.ymin + self.height
    }

    /// Non-strict overlap test: boxes sharing only an edge still intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.left() > other.right()
            || self.right() < other.left()
            || self.top() < other.bottom()
            || self.bottom() > other.top())
    }
}
