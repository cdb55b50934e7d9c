//! Polyline paths and their `d` attribute codec.
//!
//! Paths travel on the wire as `M x y L x y …` vertex lists; locally they
//! are vectors of points.

use kurbo::{Point, Rect, Vec2};
use std::f64::consts::PI;

/// A stroked polyline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Parse an `M x y L x y …` attribute. Malformed input yields `None`.
    pub fn parse(d: &str) -> Option<Self> {
        let mut points = Vec::new();
        let mut tokens = d.split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            match token {
                "M" | "L" => {
                    let x: f64 = tokens.next()?.parse().ok()?;
                    let y: f64 = tokens.next()?.parse().ok()?;
                    points.push(Point::new(x, y));
                }
                _ => return None,
            }
        }
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Format back to the wire attribute. Coordinates are rounded to two
    /// decimals, which absorbs trigonometric noise from shape construction
    /// and is well below pointer resolution.
    pub fn format(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.points.iter().enumerate() {
            if i == 0 {
                out.push_str(&format!("M {} {}", fmt_coord(p.x), fmt_coord(p.y)));
            } else {
                out.push_str(&format!(" L {} {}", fmt_coord(p.x), fmt_coord(p.y)));
            }
        }
        out
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// Axis-aligned bounding box, `None` for an empty path.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            rect.x0 = rect.x0.min(p.x);
            rect.y0 = rect.y0.min(p.y);
            rect.x1 = rect.x1.max(p.x);
            rect.y1 = rect.y1.max(p.y);
        }
        Some(rect)
    }

    /// Consecutive vertex pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

fn fmt_coord(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    // Normalise -0.0 so it never reaches the wire.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

/// Construct a regular n-gon (n ≥ 3) inside the box spanned by two drag
/// corners, in screen coordinates.
///
/// The side length comes from the box height; the first vertex sits on the
/// bottom edge, centred horizontally, and each step turns by 2π/n. The
/// sine term is subtracted because y grows downward. The returned path is
/// closed (n + 1 vertices).
pub fn regular_polygon(n: u32, corner_a: Point, corner_b: Point) -> Polyline {
    debug_assert!(n >= 3, "a polygon needs at least 3 sides");
    let n = n.max(3);

    let left = corner_a.x.min(corner_b.x);
    let right = corner_a.x.max(corner_b.x);
    let top = corner_a.y.min(corner_b.y);
    let bottom = corner_a.y.max(corner_b.y);
    let h = bottom - top;

    let nf = f64::from(n);
    let a = if n % 2 == 0 {
        h * (PI / nf).tan()
    } else {
        h / (1.0 / (2.0 * (PI / nf).sin()) + 1.0 / (2.0 * (PI / nf).tan()))
    };

    let mut points = Vec::with_capacity(n as usize + 1);
    let mut current = Point::new((left + right) / 2.0 - a / 2.0, bottom);
    points.push(current);
    let step = 2.0 * PI / nf;
    for i in 0..n {
        let theta = step * f64::from(i);
        current = Point::new(current.x + a * theta.cos(), current.y - a * theta.sin());
        points.push(current);
    }

    Polyline { points }
}
