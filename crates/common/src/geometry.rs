use crate::consts::DEG2RAD;
use crate::types::{Bounds, GeoPoint, Real};
use itertools::Itertools;

/// Distance below which a point counts as lying on a polygon edge, km.
const ON_EDGE_TOL: Real = 1e-9;

/// How points exactly on a polygon boundary are classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryRule
{
    Include,
    Exclude,
}

/// Euclidean chord length between two points of the (θ, r) plane, km.
#[must_use]
pub fn chord_dist(p: GeoPoint, q: GeoPoint) -> Real
{
    let dtheta = (q.theta - p.theta) * DEG2RAD;
    (p.radius * p.radius + q.radius * q.radius
        - 2.0 * p.radius * q.radius * dtheta.cos())
    .max(0.0)
    .sqrt()
}

fn dist_to_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> Real
{
    let (abx, aby) = (b.theta - a.theta, b.radius - a.radius);
    let (apx, apy) = (p.theta - a.theta, p.radius - a.radius);
    let len_sqr = abx * abx + aby * aby;
    if len_sqr == 0.0 {
        return (apx * apx + apy * apy).sqrt();
    }
    let t = ((apx * abx + apy * aby) / len_sqr).clamp(0.0, 1.0);
    let (dx, dy) = (apx - t * abx, apy - t * aby);
    (dx * dx + dy * dy).sqrt()
}

/// Even-odd test of `p` against the closed polygon `poly` (last vertex joins
/// back to the first). `boundary` decides membership for points lying on an
/// edge; `bounds` allows a cheap early reject.
#[must_use]
pub fn point_in_polygon(
    poly: &[GeoPoint],
    p: GeoPoint,
    boundary: BoundaryRule,
    bounds: &Bounds,
) -> bool
{
    if poly.len() < 3 || !bounds.contains(p) {
        return false;
    }

    let mut inside = false;
    for (a, b) in poly.iter().copied().circular_tuple_windows() {
        if dist_to_segment(p, a, b) < ON_EDGE_TOL {
            return boundary == BoundaryRule::Include;
        }

        if (a.radius > p.radius) != (b.radius > p.radius) {
            let t = (p.radius - a.radius) / (b.radius - a.radius);
            let crossing = a.theta + t * (b.theta - a.theta);
            if p.theta < crossing {
                inside = !inside;
            }
        }
    }
    inside
}

/// Intersection point of segments `p1q1` and `p2q2`, if they meet.
/// Collinear overlaps report no junction.
#[must_use]
pub fn segment_junction(
    p1: GeoPoint,
    q1: GeoPoint,
    p2: GeoPoint,
    q2: GeoPoint,
) -> Option<GeoPoint>
{
    let (r1x, r1y) = (q1.theta - p1.theta, q1.radius - p1.radius);
    let (r2x, r2y) = (q2.theta - p2.theta, q2.radius - p2.radius);

    let denom = r1x * r2y - r1y * r2x;
    if denom == 0.0 {
        return None;
    }

    let (dx, dy) = (p2.theta - p1.theta, p2.radius - p1.radius);
    let t = (dx * r2y - dy * r2x) / denom;
    let u = (dx * r1y - dy * r1x) / denom;

    let span = -1e-12..=1.0 + 1e-12;
    if span.contains(&t) && span.contains(&u) {
        Some(GeoPoint::new(p1.theta + t * r1x, p1.radius + t * r1y))
    } else {
        None
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn square() -> (Vec<GeoPoint>, Bounds)
    {
        let poly = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(2.0, 0.0),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(0.0, 2.0),
        ];
        let bounds = Bounds::covering(poly.iter().copied());
        (poly, bounds)
    }

    #[test]
    fn interior_and_exterior()
    {
        let (poly, bounds) = square();
        let inside = GeoPoint::new(1.0, 1.0);
        let outside = GeoPoint::new(3.0, 1.0);

        assert!(point_in_polygon(&poly, inside, BoundaryRule::Exclude, &bounds));
        assert!(!point_in_polygon(&poly, outside, BoundaryRule::Include, &bounds));
    }

    #[test]
    fn boundary_rules()
    {
        let (poly, bounds) = square();
        let on_edge = GeoPoint::new(1.0, 0.0);

        assert!(point_in_polygon(&poly, on_edge, BoundaryRule::Include, &bounds));
        assert!(!point_in_polygon(&poly, on_edge, BoundaryRule::Exclude, &bounds));
    }

    #[test]
    fn junction_of_crossing_segments()
    {
        let j = segment_junction(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(2.0, 0.0),
        )
        .unwrap();
        assert!((j.theta - 1.0).abs() < 1e-12);
        assert!((j.radius - 1.0).abs() < 1e-12);

        assert!(segment_junction(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn chord_of_identical_radii()
    {
        let p = GeoPoint::new(0.0, 6371.0);
        let q = GeoPoint::new(1.0, 6371.0);
        let d = chord_dist(p, q);
        // 1 degree of arc at the surface is just over 111 km.
        assert!((d - 111.19).abs() < 0.1);
    }
}
