//! Geometry helpers for the whiteboard eraser and selector.

use kurbo::Point;

/// Test if segments a1→a2 and b1→b2 intersect.
///
/// Parametric form; a zero denominator (parallel or colinear segments)
/// reports no intersection.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let denom = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if denom == 0.0 {
        return false;
    }

    let ua = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / denom;
    let ub = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / denom;

    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// Test if segment l1→l2 crosses any side of the rectangle spanned by r1
/// (top-left) and r2 (bottom-right), in screen coordinates.
///
/// A segment entirely inside the rectangle crosses no side; callers that
/// care about containment combine this with [`point_in_rect`].
pub fn segment_intersects_rect(l1: Point, l2: Point, r1: Point, r2: Point) -> bool {
    let top_right = Point::new(r2.x, r1.y);
    let bottom_left = Point::new(r1.x, r2.y);

    segments_intersect(l1, l2, r1, top_right)
        || segments_intersect(l1, l2, top_right, r2)
        || segments_intersect(l1, l2, r2, bottom_left)
        || segments_intersect(l1, l2, bottom_left, r1)
}

/// Axis-aligned inclusive containment test against the rectangle spanned
/// by r1 (top-left) and r2 (bottom-right).
pub fn point_in_rect(p: Point, r1: Point, r2: Point) -> bool {
    p.x >= r1.x && p.x <= r2.x && p.y >= r1.y && p.y <= r2.y
}

/// Distance from a point to the segment a→b.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = kurbo::Vec2::new(b.x - a.x, b.y - a.y);
    let pv = kurbo::Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    if points.len() == 1 {
        return point_to_segment_dist(point, points[0], points[0]);
    }
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(10.0, 0.0)));
    }

    #[test]
    fn test_disjoint_segments() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        // Includes the colinear-overlap case: the parametric form treats it
        // as no intersection.
        assert!(!segments_intersect(p(0.0, 0.0), p(10.0, 0.0), p(5.0, 0.0), p(15.0, 0.0)));
    }

    #[test]
    fn test_intersection_is_commutative() {
        let cases = [
            (p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(10.0, 0.0)),
            (p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)),
            (p(2.0, 2.0), p(4.0, 4.0), p(2.0, 4.0), p(4.0, 2.0)),
        ];
        for (a1, a2, b1, b2) in cases {
            assert_eq!(
                segments_intersect(a1, a2, b1, b2),
                segments_intersect(b1, b2, a1, a2)
            );
            assert_eq!(
                segments_intersect(a1, a2, b1, b2),
                segments_intersect(a2, a1, b2, b1)
            );
        }
    }

    #[test]
    fn test_touching_endpoint_counts() {
        assert!(segments_intersect(p(0.0, 0.0), p(5.0, 5.0), p(5.0, 5.0), p(10.0, 0.0)));
    }

    #[test]
    fn test_segment_crosses_rect_side() {
        assert!(segment_intersects_rect(
            p(-5.0, 5.0),
            p(5.0, 5.0),
            p(0.0, 0.0),
            p(10.0, 10.0)
        ));
    }

    #[test]
    fn test_segment_inside_rect_crosses_nothing() {
        assert!(!segment_intersects_rect(
            p(2.0, 2.0),
            p(8.0, 8.0),
            p(0.0, 0.0),
            p(10.0, 10.0)
        ));
    }

    #[test]
    fn test_point_in_rect_inclusive() {
        assert!(point_in_rect(p(0.0, 0.0), p(0.0, 0.0), p(10.0, 10.0)));
        assert!(point_in_rect(p(10.0, 10.0), p(0.0, 0.0), p(10.0, 10.0)));
        assert!(!point_in_rect(p(10.1, 5.0), p(0.0, 0.0), p(10.0, 10.0)));
    }

    #[test]
    fn test_polyline_distance() {
        let line = [p(0.0, 0.0), p(10.0, 0.0)];
        assert!((point_to_polyline_dist(p(5.0, 3.0), &line) - 3.0).abs() < 1e-9);
        assert!((point_to_polyline_dist(p(-4.0, 0.0), &line) - 4.0).abs() < 1e-9);
    }
}
