use crate::config::{DeviationBand, ModelSpec};
use crate::error::{Error, TraceResult};
use itertools::Itertools;
use rayon::prelude::*;
use seistrace_common::prelude::*;

/// Fixed discontinuity depths that every model carries, km.
const FIXED_DEPTHS: [Real; 4] = [
    0.0,
    EARTH_RADIUS_KM - CMB_RADIUS_KM,
    EARTH_RADIUS_KM - ICB_RADIUS_KM,
    EARTH_RADIUS_KM,
];

/// Bail-out for the edge-rectification doubling loop.
const MAX_EDGE_SAMPLES: usize = 1 << 20;

/// One region of the model: the unbounded 1D reference (index 0) or a
/// rectified polygonal patch. Perturbations are stored as multiplicative
/// factors.
#[derive(Clone, Debug)]
pub struct Region
{
    pub polyline: Vec<GeoPoint>,
    pub bounds: Bounds,
    pub dvp: Real,
    pub dvs: Real,
    pub drho: Real,
}

impl Region
{
    fn reference() -> Self
    {
        Self {
            polyline: Vec::new(),
            bounds: Bounds::unbounded(),
            dvp: 1.0,
            dvs: 1.0,
            drho: 1.0,
        }
    }
}

/// Radial layer table of one region: radii descending, one perturbed
/// property sample per layer.
#[derive(Clone, Debug)]
pub struct RegionLayers
{
    pub radii: Vec<Real>,
    pub vp: Vec<Real>,
    pub vs: Vec<Real>,
    pub rho: Vec<Real>,
}

impl RegionLayers
{
    #[must_use]
    pub fn sample_at(&self, idx: usize) -> ElasticSample
    {
        ElasticSample::new(self.vp[idx], self.vs[idx], self.rho[idx])
    }
}

/// The read-only model shared by all propagator workers.
#[derive(Clone, Debug)]
pub struct ModelContext
{
    pub regions: Vec<Region>,
    pub layers: Vec<RegionLayers>,
    /// Ascending, deduplicated, always containing the surface, CMB, ICB and
    /// center depths.
    pub special_depths: Vec<Real>,
    pub deviations: Vec<DeviationBand>,
}

impl ModelContext
{
    pub fn build(spec: &ModelSpec, rectify_limit: Real) -> TraceResult<Self>
    {
        let special_depths = merge_special_depths(&spec.special_depths);
        let r0 = reference_radii(spec, &special_depths)?;

        let mut regions = vec![Region::reference()];
        let mut slices = vec![r0.clone()];

        for (i, patch) in spec.regions.iter().enumerate() {
            if patch.vertices.len() < 3 {
                return Err(Error::BadPolygon { region: i + 1 });
            }

            let raw_bounds = Bounds::covering(patch.vertices.iter().copied());
            let min_idx = closest_layer(&r0, raw_bounds.radius_min);
            let max_idx = closest_layer(&r0, raw_bounds.radius_max);
            let (snap_min, snap_max) = (r0[min_idx], r0[max_idx]);

            let polyline = rectify_polygon(&patch.vertices, &raw_bounds, snap_min, snap_max, rectify_limit);

            let bounds = Bounds {
                radius_min: snap_min,
                radius_max: snap_max,
                ..raw_bounds
            };
            regions.push(Region {
                polyline,
                bounds,
                dvp: 1.0 + patch.dvp / 100.0,
                dvs: 1.0 + patch.dvs / 100.0,
                drho: 1.0 + patch.drho / 100.0,
            });
            slices.push(r0[max_idx..=min_idx].to_vec());
        }

        let deviations = spec.deviations.clone();
        let layers = regions
            .par_iter()
            .zip(slices.into_par_iter())
            .map(|(region, radii)| {
                let mut vp = Vec::with_capacity(radii.len());
                let mut vs = Vec::with_capacity(radii.len());
                let mut rho = Vec::with_capacity(radii.len());
                for &r in &radii {
                    let s = reference_sample(EARTH_RADIUS_KM - r, &deviations);
                    vp.push(region.dvp * s.vp);
                    vs.push(region.dvs * s.vs);
                    rho.push(region.drho * s.rho);
                }
                RegionLayers { radii, vp, vs, rho }
            })
            .collect();

        Ok(Self {
            regions,
            layers,
            special_depths,
            deviations,
        })
    }

    /// Rectified patch outlines for display; entry 0 (the 1D reference) is
    /// empty.
    #[must_use]
    pub fn region_outlines(&self) -> Vec<Vec<GeoPoint>>
    {
        self.regions.iter().map(|r| r.polyline.clone()).collect()
    }
}

/// The 1D reference properties at a depth: PREM scaled by the first matching
/// deviation band.
#[must_use]
pub fn reference_sample(depth: Real, deviations: &[DeviationBand]) -> ElasticSample
{
    let mut s = prem(depth);
    for band in deviations {
        if band.top <= depth && depth <= band.bot {
            s.vp *= 1.0 + band.dvp / 100.0;
            s.vs *= 1.0 + band.dvs / 100.0;
            s.rho *= 1.0 + band.drho / 100.0;
            break;
        }
    }
    s
}

fn merge_special_depths(user: &[Real]) -> Vec<Real>
{
    let mut depths: Vec<Real> = user.iter().copied().chain(FIXED_DEPTHS).collect();
    depths.sort_by(Real::total_cmp);
    depths.dedup();
    depths
}

/// Concatenate the per-spec grids into one descending radius list, pin the
/// endpoints to exactly `RE` and `0`, and splice in the exact radii of every
/// special depth and deviation boundary.
fn reference_radii(spec: &ModelSpec, special_depths: &[Real]) -> TraceResult<Vec<Real>>
{
    let mut base: Vec<Real> = Vec::new();
    for (index, gs) in spec.grid.iter().enumerate() {
        if gs.increment <= 0.0 || gs.depth_to <= gs.depth_from {
            return Err(Error::BadGrid { index });
        }
        let section = create_grid(
            EARTH_RADIUS_KM - gs.depth_to,
            EARTH_RADIUS_KM - gs.depth_from,
            gs.increment,
        );
        if !base.is_empty() {
            base.pop();
        }
        base.extend(section.iter().rev());
    }
    if base.len() < 2 {
        return Err(Error::BadGrid { index: 0 });
    }
    base[0] = EARTH_RADIUS_KM;
    let last = base.len() - 1;
    base[last] = 0.0;

    let mut inserts: Vec<Real> = special_depths
        .iter()
        .chain(spec.deviations.iter().flat_map(|b| [&b.top, &b.bot]))
        .map(|&d| EARTH_RADIUS_KM - d)
        .collect();
    inserts.sort_by(|a, b| b.total_cmp(a));
    inserts.dedup();

    Ok(splice_radii(&base, &inserts))
}

/// Near-uniform ascending grid over `[lo, hi]` whose step divides the span
/// evenly.
fn create_grid(lo: Real, hi: Real, inc: Real) -> Vec<Real>
{
    let n = (((hi - lo) / inc).round() as usize).max(1);
    let step = (hi - lo) / n as Real;
    let mut grid: Vec<Real> = (0..=n).map(|k| lo + k as Real * step).collect();
    grid[n] = hi;
    grid
}

/// Merge `inserts` (descending) into `base` (descending), keeping equal
/// values once. Equal comparisons are exact, which is what lets the
/// propagator classify interfaces by `==` later.
fn splice_radii(base: &[Real], inserts: &[Real]) -> Vec<Real>
{
    let mut out = Vec::with_capacity(base.len() + inserts.len());
    let mut pending = inserts.iter().copied().peekable();
    for &r in base {
        while let Some(&next) = pending.peek() {
            if next > r {
                out.push(next);
                pending.next();
            } else if next == r {
                pending.next();
            } else {
                break;
            }
        }
        out.push(r);
    }
    out.extend(pending);
    out
}

/// Index of the entry of a descending radius list closest to `r`.
#[must_use]
pub(crate) fn closest_layer(radii: &[Real], r: Real) -> usize
{
    let idx = radii.partition_point(|&x| x > r);
    if idx == 0 {
        0
    } else if idx == radii.len() {
        radii.len() - 1
    } else if (radii[idx - 1] - r).abs() < (r - radii[idx]).abs() {
        idx - 1
    } else {
        idx
    }
}

/// Index of the entry of an ascending depth list closest to `d`.
#[must_use]
pub(crate) fn closest_depth(depths: &[Real], d: Real) -> usize
{
    let idx = depths.partition_point(|&x| x < d);
    if idx == 0 {
        0
    } else if idx == depths.len() {
        depths.len() - 1
    } else if (depths[idx] - d).abs() < (d - depths[idx - 1]).abs() {
        idx
    } else {
        idx - 1
    }
}

/// Resample every polygon edge into chords no longer than `limit` km.
/// Vertices sitting on the polygon's radial extremes are first snapped onto
/// the reference grid, so the patch's top and bottom respect the 1D layering.
fn rectify_polygon(
    vertices: &[GeoPoint],
    raw_bounds: &Bounds,
    snap_min: Real,
    snap_max: Real,
    limit: Real,
) -> Vec<GeoPoint>
{
    let snap = |r: Real| {
        if r == raw_bounds.radius_min {
            snap_min
        } else if r == raw_bounds.radius_max {
            snap_max
        } else {
            r
        }
    };

    let mut polyline = Vec::new();
    for (a, b) in vertices.iter().copied().circular_tuple_windows() {
        let (r1, r2) = (snap(a.radius), snap(b.radius));
        let (t1, t2) = (a.theta, b.theta);
        let (t_dist, r_dist) = (t2 - t1, r2 - r1);

        let mut npts: usize = 2;
        let mut chord = EARTH_RADIUS_KM;
        let (mut dt, mut dr) = (t_dist, r_dist);
        while chord > limit && npts < MAX_EDGE_SAMPLES {
            npts *= 2;
            dt = t_dist / (npts - 1) as Real;
            dr = r_dist / (npts - 1) as Real;
            chord = chord_dist(GeoPoint::new(t1, r1), GeoPoint::new(t1 + dt, r1 + dr));
        }

        for k in 0..npts - 1 {
            polyline.push(GeoPoint::new(t1 + k as Real * dt, r1 + k as Real * dr));
        }
    }
    polyline
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::{GridSpec, RegionSpec};

    fn basic_spec() -> ModelSpec
    {
        ModelSpec {
            grid: vec![GridSpec {
                depth_from: 0.0,
                depth_to: 6371.0,
                increment: 50.0,
            }],
            special_depths: vec![410.0, 660.0],
            deviations: Vec::new(),
            regions: Vec::new(),
        }
    }

    #[test]
    fn reference_grid_contains_exact_interface_radii()
    {
        let ctx = ModelContext::build(&basic_spec(), 1.0).unwrap();
        let r0 = &ctx.layers[0].radii;

        assert_eq!(r0[0], EARTH_RADIUS_KM);
        assert_eq!(*r0.last().unwrap(), 0.0);
        for r in [CMB_RADIUS_KM, ICB_RADIUS_KM, EARTH_RADIUS_KM - 410.0, EARTH_RADIUS_KM - 660.0] {
            assert!(r0.contains(&r), "missing exact radius {r}");
        }
        for w in r0.windows(2) {
            assert!(w[0] > w[1], "radii must descend strictly");
        }
    }

    #[test]
    fn splice_is_idempotent()
    {
        let spec = basic_spec();
        let depths = merge_special_depths(&spec.special_depths);
        let first = reference_radii(&spec, &depths).unwrap();

        let inserts: Vec<Real> = {
            let mut v: Vec<Real> = depths.iter().map(|&d| EARTH_RADIUS_KM - d).collect();
            v.sort_by(|a, b| b.total_cmp(a));
            v
        };
        let second = splice_radii(&first, &inserts);
        assert_eq!(first, second);
    }

    #[test]
    fn fixed_depths_always_present()
    {
        let depths = merge_special_depths(&[]);
        assert_eq!(depths, vec![0.0, 2891.0, 5149.5, 6371.0]);
    }

    #[test]
    fn rectified_edges_respect_the_chord_limit()
    {
        let mut spec = basic_spec();
        spec.regions.push(RegionSpec::from_depths(
            &[1.0, 3.0, 3.0, 1.0],
            &[200.0, 200.0, 400.0, 400.0],
            5.0,
            0.0,
            0.0,
        ));
        let limit = 2.0;
        let ctx = ModelContext::build(&spec, limit).unwrap();
        let poly = &ctx.regions[1].polyline;

        assert!(poly.len() >= 12);
        for (a, b) in poly.iter().copied().circular_tuple_windows() {
            // The closing chord joins the last edge's final sample back to the
            // first vertex and stays within one subdivision as well.
            assert!(chord_dist(a, b) <= limit + 1e-9);
        }

        // Patch extremes sit exactly on reference layers.
        let r0 = &ctx.layers[0].radii;
        assert!(r0.contains(&ctx.regions[1].bounds.radius_min));
        assert!(r0.contains(&ctx.regions[1].bounds.radius_max));

        // The patch layer table is a contiguous slice of the reference table.
        let rk = &ctx.layers[1].radii;
        let start = r0.iter().position(|r| r == &rk[0]).unwrap();
        assert_eq!(&r0[start..start + rk.len()], rk.as_slice());
    }

    #[test]
    fn perturbed_patch_scales_velocities()
    {
        let mut spec = basic_spec();
        spec.regions.push(RegionSpec::from_depths(
            &[1.0, 3.0, 3.0, 1.0],
            &[200.0, 200.0, 400.0, 400.0],
            5.0,
            0.0,
            0.0,
        ));
        let ctx = ModelContext::build(&spec, 1.0).unwrap();
        let rk = &ctx.layers[1];
        let r0 = &ctx.layers[0];
        let start = r0.radii.iter().position(|r| r == &rk.radii[0]).unwrap();

        for j in 0..rk.radii.len() {
            let base = r0.vp[start + j];
            assert!((rk.vp[j] - base * 1.05).abs() < 1e-12);
            assert!((rk.vs[j] - r0.vs[start + j]).abs() < 1e-12);
        }
    }

    #[test]
    fn deviation_band_applies_once()
    {
        let bands = [DeviationBand {
            top: 100.0,
            bot: 200.0,
            dvp: 10.0,
            dvs: 0.0,
            drho: 0.0,
        }];
        let inside = reference_sample(150.0, &bands);
        let outside = reference_sample(250.0, &bands);
        assert!((inside.vp / prem(150.0).vp - 1.10).abs() < 1e-12);
        assert_eq!(outside.vp, prem(250.0).vp);
    }
}
