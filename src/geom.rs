//! Geometry primitives shared by parsed values and derived artifacts.

extern crate alloc;

use alloc::vec::Vec;

/// 2D affine transform `[a c e; b d f; 0 0 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Horizontal scale / x component of the x basis.
    pub a: f64,
    /// Y component of the x basis.
    pub b: f64,
    /// X component of the y basis.
    pub c: f64,
    /// Vertical scale / y component of the y basis.
    pub d: f64,
    /// Horizontal translation.
    pub e: f64,
    /// Vertical translation.
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a transform from its six matrix components.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation.
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Pure (possibly non-uniform) scale.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Matrix product `self * rhs` (`rhs` applies first).
    pub fn multiply(self, rhs: Self) -> Self {
        Self {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    /// Apply `self`, then `next`.
    pub fn then(self, next: Self) -> Self {
        next.multiply(self)
    }

    /// Map a point through the transform.
    pub fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// True when this is exactly the identity.
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

impl From<svgtypes::Transform> for Transform {
    fn from(ts: svgtypes::Transform) -> Self {
        Self::new(ts.a, ts.b, ts.c, ts.d, ts.e, ts.f)
    }
}

/// Width and height in user units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in user units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One absolute path-drawing command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Straight line.
    LineTo {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Cubic Bézier curve.
    CubicTo {
        /// First control point x.
        x1: f64,
        /// First control point y.
        y1: f64,
        /// Second control point x.
        x2: f64,
        /// Second control point y.
        y2: f64,
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Quadratic Bézier curve.
    QuadTo {
        /// Control point x.
        x1: f64,
        /// Control point y.
        y1: f64,
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Elliptical arc.
    ArcTo {
        /// Horizontal radius.
        rx: f64,
        /// Vertical radius.
        ry: f64,
        /// Rotation of the ellipse x axis in degrees.
        x_axis_rotation: f64,
        /// Take the larger of the two candidate arcs.
        large_arc: bool,
        /// Sweep in the positive-angle direction.
        sweep: bool,
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// Close the current subpath.
    ClosePath,
}

/// Converts raw path segments into absolute [`PathCommand`]s.
///
/// Relative coordinates are resolved against the current point, horizontal and
/// vertical lines become [`PathCommand::LineTo`], and smooth curve shorthands
/// get their reflected control point.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PathNormalizer {
    current: (f64, f64),
    subpath_start: (f64, f64),
    last_cubic_ctrl: Option<(f64, f64)>,
    last_quad_ctrl: Option<(f64, f64)>,
}

impl PathNormalizer {
    pub(crate) fn push(&mut self, segment: svgtypes::PathSegment, out: &mut Vec<PathCommand>) {
        use svgtypes::PathSegment as S;

        let (cx, cy) = self.current;
        let resolve = |abs: bool, x: f64, y: f64| if abs { (x, y) } else { (cx + x, cy + y) };
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;

        let command = match segment {
            S::MoveTo { abs, x, y } => {
                let (x, y) = resolve(abs, x, y);
                self.subpath_start = (x, y);
                PathCommand::MoveTo { x, y }
            }
            S::LineTo { abs, x, y } => {
                let (x, y) = resolve(abs, x, y);
                PathCommand::LineTo { x, y }
            }
            S::HorizontalLineTo { abs, x } => {
                let x = if abs { x } else { cx + x };
                PathCommand::LineTo { x, y: cy }
            }
            S::VerticalLineTo { abs, y } => {
                let y = if abs { y } else { cy + y };
                PathCommand::LineTo { x: cx, y }
            }
            S::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let (x1, y1) = resolve(abs, x1, y1);
                let (x2, y2) = resolve(abs, x2, y2);
                let (x, y) = resolve(abs, x, y);
                cubic_ctrl = Some((x2, y2));
                PathCommand::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                }
            }
            S::SmoothCurveTo { abs, x2, y2, x, y } => {
                let (x1, y1) = reflect(self.last_cubic_ctrl, self.current);
                let (x2, y2) = resolve(abs, x2, y2);
                let (x, y) = resolve(abs, x, y);
                cubic_ctrl = Some((x2, y2));
                PathCommand::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                }
            }
            S::Quadratic { abs, x1, y1, x, y } => {
                let (x1, y1) = resolve(abs, x1, y1);
                let (x, y) = resolve(abs, x, y);
                quad_ctrl = Some((x1, y1));
                PathCommand::QuadTo { x1, y1, x, y }
            }
            S::SmoothQuadratic { abs, x, y } => {
                let (x1, y1) = reflect(self.last_quad_ctrl, self.current);
                let (x, y) = resolve(abs, x, y);
                quad_ctrl = Some((x1, y1));
                PathCommand::QuadTo { x1, y1, x, y }
            }
            S::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let (x, y) = resolve(abs, x, y);
                PathCommand::ArcTo {
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                }
            }
            S::ClosePath { .. } => PathCommand::ClosePath,
        };

        self.current = match command {
            PathCommand::MoveTo { x, y }
            | PathCommand::LineTo { x, y }
            | PathCommand::CubicTo { x, y, .. }
            | PathCommand::QuadTo { x, y, .. }
            | PathCommand::ArcTo { x, y, .. } => (x, y),
            PathCommand::ClosePath => self.subpath_start,
        };
        self.last_cubic_ctrl = cubic_ctrl;
        self.last_quad_ctrl = quad_ctrl;
        out.push(command);
    }
}

fn reflect(ctrl: Option<(f64, f64)>, current: (f64, f64)) -> (f64, f64) {
    match ctrl {
        Some((x, y)) => (2.0 * current.0 - x, 2.0 * current.1 - y),
        None => current,
    }
}
