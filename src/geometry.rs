//! Pure shape math: polygon generation, jitter, point clamping and smooth
//! closed-path construction. Every function is total; degenerate input
//! degrades to a documented fallback instead of panicking.

use rand::Rng;

use crate::core::{BezPath, Node, Point};

/// Radius below which generated geometry collapses into an invisible speck.
pub const MIN_SHAPE_RADIUS: f64 = 0.2;
/// Radius above which geometry overflows the artboard guides.
pub const MAX_SHAPE_RADIUS: f64 = 1.2;

/// Spline tension at curviness 0; curviness 1 adds [`TENSION_RANGE`] on top.
pub const BASE_TENSION: f64 = 0.55;
pub const TENSION_RANGE: f64 = 0.35;

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Builds a regular polygon of `max(3, round(sides))` nodes on a circle of
/// `radius` (clamped to [[`MIN_SHAPE_RADIUS`], [`MAX_SHAPE_RADIUS`]]),
/// starting at -90° and winding clockwise in screen space.
///
/// Coordinates are shape-local, normalized to [-1, 1].
pub fn regular_polygon(sides: f64, radius: f64) -> Vec<Node> {
    let n = finite_or(sides, 3.0).round().max(3.0) as usize;
    let r = finite_or(radius, 1.0).clamp(MIN_SHAPE_RADIUS, MAX_SHAPE_RADIUS);

    (0..n)
        .map(|i| {
            let angle = -std::f64::consts::FRAC_PI_2
                + (i as f64) * std::f64::consts::TAU / (n as f64);
            Node::new(format!("n{i}"), r * angle.cos(), r * angle.sin())
        })
        .collect()
}

/// Perturbs each node's radial magnitude and angular position independently,
/// drawing uniformly from [-amount, amount] (amount clamped to [0, 0.5]).
/// The radial draw is in shape-local units; the angular draw treats `amount`
/// as a fraction of a half-turn, so the sampled value is scaled by pi
/// radians before being applied.
///
/// The radial magnitude is floored at [`MIN_SHAPE_RADIUS`] so no node can
/// collapse onto the origin.
pub fn jitter_polygon<R: Rng + ?Sized>(nodes: &[Node], amount: f64, rng: &mut R) -> Vec<Node> {
    let amount = finite_or(amount, 0.0).clamp(0.0, 0.5);

    nodes
        .iter()
        .map(|node| {
            let x = finite_or(node.x, 0.0);
            let y = finite_or(node.y, 0.0);
            let angle = y.atan2(x) + rng.random_range(-amount..=amount) * std::f64::consts::PI;
            let mag = (x.hypot(y) + rng.random_range(-amount..=amount)).max(MIN_SHAPE_RADIUS);
            Node::new(node.id.clone(), mag * angle.cos(), mag * angle.sin())
        })
        .collect()
}

/// Rescales `p` onto the circle of `radius` when it lies outside; points at
/// or inside the circle (including the origin) pass through unchanged.
///
/// Used to keep interactively dragged nodes inside the artboard.
pub fn clamp_point(p: Point, radius: f64) -> Point {
    if !p.x.is_finite() || !p.y.is_finite() {
        return Point::ORIGIN;
    }
    let radius = finite_or(radius, 1.0).max(0.0);
    let dist = p.x.hypot(p.y);
    if dist <= radius || dist == 0.0 {
        return p;
    }
    let scale = radius / dist;
    Point::new(p.x * scale, p.y * scale)
}

/// Builds a closed, fillable path through all `points` using cardinal-spline
/// control points derived from each point's previous/next neighbors, scaled
/// by the tension `BASE_TENSION + curviness * TENSION_RANGE`.
///
/// Degenerate inputs degrade instead of erroring: no points yields an empty
/// path, a single point a point stub, two points (or near-zero curviness) a
/// straight closed polyline. Identical `(points, curviness)` always produces
/// a bit-identical path, so golden tests may compare `BezPath::to_svg()`
/// strings directly.
pub fn smooth_closed_path(points: &[Point], curviness: f64) -> BezPath {
    let pts: Vec<Point> = points
        .iter()
        .map(|p| Point::new(finite_or(p.x, 0.0), finite_or(p.y, 0.0)))
        .collect();
    let curviness = finite_or(curviness, 0.0).clamp(0.0, 1.0);

    let mut path = BezPath::new();
    match pts.len() {
        0 => return path,
        1 => {
            path.move_to(pts[0]);
            path.close_path();
            return path;
        }
        _ => {}
    }

    if pts.len() == 2 || curviness < 1e-3 {
        path.move_to(pts[0]);
        for p in &pts[1..] {
            path.line_to(*p);
        }
        path.close_path();
        return path;
    }

    let n = pts.len();
    let tension = BASE_TENSION + curviness * TENSION_RANGE;
    // Tangent at point i from the chord between its neighbors; dividing by 3
    // converts the Hermite tangent into cubic Bezier control offsets.
    let tangent = |i: usize| -> (f64, f64) {
        let prev = pts[(i + n - 1) % n];
        let next = pts[(i + 1) % n];
        (
            (next.x - prev.x) * tension / 3.0,
            (next.y - prev.y) * tension / 3.0,
        )
    };

    path.move_to(pts[0]);
    for i in 0..n {
        let j = (i + 1) % n;
        let (tix, tiy) = tangent(i);
        let (tjx, tjy) = tangent(j);
        path.curve_to(
            Point::new(pts[i].x + tix, pts[i].y + tiy),
            Point::new(pts[j].x - tjx, pts[j].y - tjy),
            pts[j],
        );
    }
    path.close_path();
    path
}
