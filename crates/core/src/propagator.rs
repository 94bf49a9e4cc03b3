use crate::coefficients::{InterfaceKind, Polarity, plane_wave_coefficients};
use crate::config::{ScatterFlags, WaveComp};
use crate::error::{Error, TraceResult};
use crate::model::{ModelContext, closest_depth};
use crate::ray::Ray;
use crate::shoot::{Shot, shoot};
use itertools::Itertools;
use num_traits::One;
use seistrace_common::prelude::*;

/// The four scattering channels, in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Channel
{
    #[display("TS")]
    Ts,
    #[display("TD")]
    Td,
    #[display("RD")]
    Rd,
    #[display("RS")]
    Rs,
}

/// Everything the scheduler needs to spawn one child ray.
#[derive(Clone, Debug)]
pub(crate) struct ChildSpec
{
    pub channel: Channel,
    pub is_p: bool,
    pub comp: WaveComp,
    pub position: GeoPoint,
    pub ray_param: Real,
    pub takeoff: Real,
    pub in_region: usize,
    pub coefficient: Cplx,
}

#[derive(Clone, Debug)]
pub(crate) enum LegOutcome
{
    /// The head arrived with no legs left; nothing happens.
    Skipped,
    /// The shot produced at most one sample; the ray dies quietly.
    Trivial,
    Completed(Box<LegReport>),
}

#[derive(Clone, Debug)]
pub(crate) struct LegReport
{
    pub travel_time: Real,
    pub travel_dist: Real,
    pub incident: Real,
    pub path: Vec<GeoPoint>,
    pub surfaced: bool,
    pub surface_theta: Real,
    /// Children in (ts, td, rd, rs) order.
    pub children: Vec<ChildSpec>,
    /// User-enabled channels that physics disabled on this leg.
    pub forfeited: u32,
}

/// Follow one leg of the ray at arena index `slot`.
///
/// Shoots the head through its current region between the two special depths
/// surrounding it, detects whether the leg crosses into another region,
/// resolves the interface geometry at the end of the leg, and derives the up
/// to four scattered children with their take-off angles, ray parameters and
/// amplitude coefficients.
pub(crate) fn follow_ray(
    ctx: &ModelContext,
    flags: &ScatterFlags,
    slot: usize,
    head: &Ray,
) -> TraceResult<LegOutcome>
{
    if head.remaining_legs == 0 {
        return Ok(LegOutcome::Skipped);
    }

    let cur = head.in_region;
    let layers = &ctx.layers[cur];
    let region = &ctx.regions[cur];

    // Target depth window: the adjacent special depth on the side the ray is
    // heading, clamped to the region's radial span.
    let head_depth = EARTH_RADIUS_KM - head.pr;
    let sd = &ctx.special_depths;
    let closest = closest_depth(sd, head_depth);
    let next_depth = if head.go_up && sd[closest] >= head_depth {
        if closest == 0 {
            return Ok(LegOutcome::Trivial);
        }
        sd[closest - 1]
    } else if !head.go_up && sd[closest] <= head_depth {
        if closest + 1 == sd.len() {
            return Ok(LegOutcome::Trivial);
        }
        sd[closest + 1]
    } else {
        sd[closest]
    };
    let top = head_depth
        .min(next_depth)
        .max(EARTH_RADIUS_KM - region.bounds.radius_max);
    let bot = head_depth
        .max(next_depth)
        .min(EARTH_RADIUS_KM - region.bounds.radius_min);

    log::debug!(
        "ray {slot}: {} going {}{} in region {cur}, window [{top}, {bot}] km, rayp {}",
        head.comp,
        if head.go_up { "up" } else { "down" },
        if head.go_left { "-left" } else { "-right" },
        head.ray_param,
    );

    let vel = if head.is_p { &layers.vp } else { &layers.vs };
    let Shot {
        time: mut travel_time,
        dist: mut travel_dist,
        mut degrees,
        last_index,
        turned,
    } = shoot(&layers.radii, vel, head.ray_param, top, bot);

    let len = degrees.len();
    if len <= 1 {
        return Ok(LegOutcome::Trivial);
    }

    // Orient the polyline so index 0 is the ray origin.
    if head.go_up {
        let total = degrees[len - 1];
        for d in degrees.iter_mut() {
            *d = total - *d;
        }
        degrees.reverse();
    }

    let (ilast, ilen) = (last_index as isize, len as isize);
    let go_up = head.go_up;
    let r_index = move |j: isize| -> usize {
        if go_up {
            (ilast - j) as usize
        } else {
            (j + ilast - ilen + 1) as usize
        }
    };
    let m = if head.go_left { -1.0 } else { 1.0 };
    let sample =
        |j: isize| -> GeoPoint { GeoPoint::new(head.pt + m * degrees[j as usize], layers.radii[r_index(j)]) };

    // Scan the leg for a region transition.
    let mut ray_end: Option<isize> = None;
    let mut next_region = cur;
    'scan: for j in 0..ilen {
        let pnt = sample(j);
        if cur != 0 {
            if point_in_polygon(&region.polyline, pnt, BoundaryRule::Include, &region.bounds) {
                continue;
            }
            ray_end = Some(j);
            next_region = 0;
            for (k, other) in ctx.regions.iter().enumerate().skip(1) {
                if k != cur
                    && point_in_polygon(&other.polyline, pnt, BoundaryRule::Exclude, &other.bounds)
                {
                    next_region = k;
                    break;
                }
            }
            break 'scan;
        }
        for (k, other) in ctx.regions.iter().enumerate().skip(1) {
            if point_in_polygon(&other.polyline, pnt, BoundaryRule::Include, &other.bounds) {
                ray_end = Some(j);
                next_region = k;
                break 'scan;
            }
        }
    }

    // Resolve the geometry at the end of the leg. A transition ends the leg
    // on a polygon edge; otherwise it ends on a horizontal discontinuity
    // where the ray parameter is conserved.
    let path_len: isize;
    let next_r: GeoPoint;
    let next_t: GeoPoint;
    let junc: GeoPoint;
    let tilt: Real;
    let p2: GeoPoint;
    let q2: GeoPoint;

    if let Some(end) = ray_end {
        if end == 0 {
            return Err(Error::NoJunction { slot });
        }
        // Reflected children restart from the last sample inside the current
        // region, transmitted children from the first sample beyond.
        next_r = sample(end - 1);
        next_t = sample(end);

        travel_time = 0.0;
        travel_dist = 0.0;
        for j in 0..end - 1 {
            let d = chord_dist(sample(j), sample(j + 1));
            travel_dist += d;
            // Current-region velocity; the far side may be a fluid layer.
            travel_time += d / vel[r_index(j + 1)];
        }

        let search = if next_region == 0 { cur } else { next_region };
        let mut found = None;
        for (a, b) in ctx.regions[search]
            .polyline
            .iter()
            .copied()
            .circular_tuple_windows()
        {
            if let Some(x) = segment_junction(a, b, next_r, next_t) {
                found = Some((a, b, x));
                break;
            }
        }
        let Some((edge_a, edge_b, junction)) = found else {
            return Err(Error::NoJunction { slot });
        };
        junc = junction;
        log::trace!("ray {slot}: junction with region {search} at {junc}");

        // Compensate for the clipped part of the last segment.
        let dlx = (next_r.theta - junc.theta) * DEG2RAD * junc.radius;
        let dly = next_r.radius - junc.radius;
        let dl = (dlx * dlx + dly * dly).sqrt();
        travel_dist += dl;
        travel_time += dl / vel[r_index(end - 1)];

        tilt = RAD2DEG
            * (edge_b.radius - edge_a.radius)
                .atan2((edge_b.theta - edge_a.theta) * DEG2RAD * junc.radius);
        p2 = next_r;
        q2 = next_t;
        path_len = end;
    } else {
        next_r = sample(ilen - 1);
        next_t = next_r;
        p2 = sample(ilen - 2);
        q2 = next_t;
        tilt = 0.0;
        junc = next_t;
        path_len = ilen;
    }
    let crossed = next_region != cur;

    // Incidence: acute angle between the last segment and the interface
    // normal.
    let rayd = RAD2DEG * (q2.radius - p2.radius).atan2((q2.theta - p2.theta) * DEG2RAD * junc.radius);
    let rayd_hor = wrap_360(rayd - tilt);
    let folded = wrap_180(rayd_hor).abs();
    let incident = if folded > 90.0 { folded - 90.0 } else { 90.0 - folded };
    log::trace!("ray {slot}: direction {rayd} deg, tilt {tilt} deg, incidence {incident} deg");

    // Medium on each side of the interface. Entering another region strips
    // the current region's scaling and applies the next one's.
    let (s1, s2) = if let Some(end) = ray_end.filter(|_| crossed) {
        let s1 = layers.sample_at(r_index(end - 1));
        let raw = layers.sample_at(r_index(end));
        let (a, b) = (&ctx.regions[cur], &ctx.regions[next_region]);
        (
            s1,
            ElasticSample::new(
                raw.vp / a.dvp * b.dvp,
                raw.vs / a.dvs * b.dvs,
                raw.rho / a.drho * b.drho,
            ),
        )
    } else {
        let si = if head.go_up { path_len - 1 } else { path_len };
        let hi = layers.radii.len() - 1;
        (
            layers.sample_at(r_index(si - 1).min(hi)),
            layers.sample_at(r_index(si).min(hi)),
        )
    };

    let kind = InterfaceKind::classify(next_r.radius, head.go_up).refine(s1.vs, s2.vs);
    log::trace!("ray {slot}: {kind} interface at {next_r}");
    let polarity = if head.comp == WaveComp::Sh {
        Polarity::Sh
    } else {
        Polarity::Psv
    };
    let mut coefs = plane_wave_coefficients(s1, s2, incident, polarity, kind);
    if turned {
        // Total reflection at the turning point.
        coefs.rpp = Cplx::one();
        coefs.rss = Cplx::one();
    }

    let mut ts = flags.ts;
    let mut td = flags.td && head.comp != WaveComp::Sh;
    let mut rd = flags.rd && head.comp != WaveComp::Sh;

    let snell_diff =
        |c1: Real, c2: Real| ((incident * DEG2RAD).sin() * c2 / c1).asin() * RAD2DEG - incident;
    let fold = |x: Real, diff: Real| {
        if (0.0 < x && x <= 90.0) || (180.0 < x && x <= 270.0) {
            wrap_180(x - diff + tilt + 90.0)
        } else {
            wrap_180(x + diff + tilt + 90.0)
        }
    };

    // Transmission, same type.
    let (c1_ts, c2_ts) = if head.is_p { (s1.vp, s2.vp) } else { (s1.vs, s2.vs) };
    let diff_ts = snell_diff(c1_ts, c2_ts);
    ts &= !diff_ts.is_nan();
    let take_ts = fold(rayd_hor, diff_ts);
    let rayp_ts = if crossed {
        DEG2RAD * next_t.radius * (take_ts.abs() * DEG2RAD).sin() / c2_ts
    } else {
        head.ray_param
    };
    ts &= !rayp_ts.is_nan();

    // Transmission, converted type.
    let (c1_td, c2_td) = if head.is_p { (s1.vp, s2.vs) } else { (s1.vs, s2.vp) };
    let diff_td = snell_diff(c1_td, c2_td);
    td &= !diff_td.is_nan();
    let take_td = fold(rayd_hor, diff_td);
    let rayp_td = if crossed {
        DEG2RAD * next_t.radius * (take_td.abs() * DEG2RAD).sin() / c2_td
    } else {
        head.ray_param
    };
    td &= !rayp_td.is_nan();

    // Reflection, converted type: the horizontal direction mirrors first.
    let (c1_rd, c2_rd) = if head.is_p { (s1.vp, s1.vs) } else { (s1.vs, s1.vp) };
    let diff_rd = snell_diff(c1_rd, c2_rd);
    rd &= !diff_rd.is_nan();
    let take_rd = fold(wrap_360(-rayd_hor), diff_rd);
    let rayp_rd = if crossed {
        DEG2RAD * next_r.radius * (take_rd.abs() * DEG2RAD).sin() / c2_rd
    } else {
        head.ray_param
    };
    rd &= !rayp_rd.is_nan();

    // Reflection, same type.
    let take_rs = wrap_180(-rayd_hor + tilt + 90.0);
    let c1_rs = if head.is_p { s1.vp } else { s1.vs };
    let rayp_rs = if crossed {
        DEG2RAD * next_r.radius * (take_rs.abs() * DEG2RAD).sin() / c1_rs
    } else {
        head.ray_param
    };

    // Physics gating on top of the user's channel mask.
    if !head.go_up && turned {
        ts = false;
        td = false;
        rd = false;
    }
    if next_r.radius == EARTH_RADIUS_KM {
        ts = false;
        td = false;
    }
    // Entering the outer core downward or the inner core upward: S waves do
    // not exist on the far side.
    if (!head.go_up && next_t.radius == CMB_RADIUS_KM)
        || (head.go_up && next_t.radius == ICB_RADIUS_KM)
    {
        ts &= head.is_p;
        td &= !head.is_p;
    }
    // P reflecting off a boundary whose near side is fluid cannot convert.
    if !head.go_up && head.is_p && next_r.radius == ICB_RADIUS_KM {
        rd = false;
    }
    if head.go_up && head.is_p && next_r.radius == CMB_RADIUS_KM {
        rd = false;
    }

    let mut children = Vec::with_capacity(4);
    if ts {
        children.push(ChildSpec {
            channel: Channel::Ts,
            is_p: head.is_p,
            comp: head.comp,
            position: next_t,
            ray_param: rayp_ts,
            takeoff: take_ts,
            in_region: next_region,
            coefficient: if head.is_p { coefs.tpp } else { coefs.tss },
        });
    }
    let converted = if head.is_p { WaveComp::Sv } else { WaveComp::P };
    if td {
        children.push(ChildSpec {
            channel: Channel::Td,
            is_p: !head.is_p,
            comp: converted,
            position: next_t,
            ray_param: rayp_td,
            takeoff: take_td,
            in_region: next_region,
            coefficient: if head.is_p { coefs.tps } else { coefs.tsp },
        });
    }
    if rd {
        children.push(ChildSpec {
            channel: Channel::Rd,
            is_p: !head.is_p,
            comp: converted,
            position: next_r,
            ray_param: rayp_rd,
            takeoff: take_rd,
            in_region: cur,
            coefficient: if head.is_p { coefs.rps } else { coefs.rsp },
        });
    }
    if flags.rs {
        children.push(ChildSpec {
            channel: Channel::Rs,
            is_p: head.is_p,
            comp: head.comp,
            position: next_r,
            ray_param: rayp_rs,
            takeoff: take_rs,
            in_region: cur,
            coefficient: if head.is_p { coefs.rpp } else { coefs.rss },
        });
    }

    let forfeited =
        u32::from(flags.ts && !ts) + u32::from(flags.td && !td) + u32::from(flags.rd && !rd);

    let path = (0..path_len).map(|j| sample(j)).collect();

    Ok(LegOutcome::Completed(Box::new(LegReport {
        travel_time,
        travel_dist,
        incident,
        path,
        surfaced: next_r.radius == EARTH_RADIUS_KM,
        surface_theta: next_r.theta,
        children,
        forfeited,
    })))
}
