//! Minimal enclosing circle of a point set.
//!
//! Incremental Welzl construction: grow the circle point by point,
//! rebuilding on one or two boundary points whenever a new point falls
//! outside. Deterministic (no shuffling): contour chains are short
//! enough that the worst case does not matter, and detection results
//! must not vary between runs on the same image.

/// A circle in continuous pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnclosingCircle {
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
    /// Radius.
    pub radius: f64,
}

impl EnclosingCircle {
    /// Containment with a tolerance scaled to the radius, so boundary
    /// points survive floating-point noise.
    fn contains(&self, p: (f64, f64)) -> bool {
        let dx = p.0 - self.cx;
        let dy = p.1 - self.cy;
        dx.hypot(dy) <= self.radius + 1e-7 * (1.0 + self.radius)
    }
}

/// Smallest circle enclosing all of `points`.
///
/// Returns `None` for an empty input. A single point yields a
/// zero-radius circle.
#[must_use]
pub fn min_enclosing_circle(points: &[(f64, f64)]) -> Option<EnclosingCircle> {
    let (&first, rest) = points.split_first()?;
    let mut circle = EnclosingCircle {
        cx: first.0,
        cy: first.1,
        radius: 0.0,
    };
    for (i, &p) in rest.iter().enumerate() {
        if !circle.contains(p) {
            circle = with_one_boundary(&points[..=i], p);
        }
    }
    Some(circle)
}

/// Smallest circle over `points` with `q` known to lie on the boundary.
fn with_one_boundary(points: &[(f64, f64)], q: (f64, f64)) -> EnclosingCircle {
    let mut circle = EnclosingCircle {
        cx: q.0,
        cy: q.1,
        radius: 0.0,
    };
    for (i, &p) in points.iter().enumerate() {
        if !circle.contains(p) {
            circle = with_two_boundary(&points[..i], q, p);
        }
    }
    circle
}

/// Smallest circle over `points` with `q1` and `q2` on the boundary.
fn with_two_boundary(points: &[(f64, f64)], q1: (f64, f64), q2: (f64, f64)) -> EnclosingCircle {
    let mut circle = diameter_circle(q1, q2);
    for &p in points {
        if !circle.contains(p) {
            circle = circumcircle(q1, q2, p);
        }
    }
    circle
}

/// Circle with the segment `a`–`b` as diameter.
fn diameter_circle(a: (f64, f64), b: (f64, f64)) -> EnclosingCircle {
    let cx = (a.0 + b.0) / 2.0;
    let cy = (a.1 + b.1) / 2.0;
    EnclosingCircle {
        cx,
        cy,
        radius: (a.0 - cx).hypot(a.1 - cy),
    }
}

/// Circumscribed circle of three points; falls back to the widest
/// two-point circle when they are (nearly) collinear.
fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> EnclosingCircle {
    let bx = b.0 - a.0;
    let by = b.1 - a.1;
    let cx = c.0 - a.0;
    let cy = c.1 - a.1;
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < 1e-12 {
        let candidates = [
            diameter_circle(a, b),
            diameter_circle(a, c),
            diameter_circle(b, c),
        ];
        return candidates
            .into_iter()
            .max_by(|p, q| p.radius.total_cmp(&q.radius))
            .unwrap_or(candidates[0]);
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    EnclosingCircle {
        cx: a.0 + ux,
        cy: a.1 + uy,
        radius: ux.hypot(uy),
    }
}
