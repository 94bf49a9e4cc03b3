use crate::config::{SeedRay, TraceSettings};
use crate::error::{Error, TraceResult};
use crate::model::{ModelContext, reference_sample};
use crate::ray::Ray;
use seistrace_common::prelude::*;

/// 1 + b + ... + b^(terms-1), saturating at `u128::MAX`.
pub(crate) fn geometric_sum(b: u128, terms: u128) -> u128
{
    if b <= 1 {
        return terms;
    }
    let mut total: u128 = 0;
    let mut pow: u128 = 1;
    for _ in 0..terms {
        total = total.saturating_add(pow);
        if total == u128::MAX {
            break;
        }
        pow = pow.saturating_mul(b);
    }
    total
}

/// Upper bound on the number of ray heads the given seeds can ever spawn.
pub(crate) fn worst_case_tree(seeds: &[SeedRay], branches: usize) -> u128
{
    seeds
        .iter()
        .map(|s| geometric_sum(branches as u128, u128::from(s.steps) + 1))
        .sum()
}

/// Place each seed in its enclosing region, convert its take-off angle to a
/// ray parameter, and produce the initial ray heads. Rejects seed sets whose
/// worst-case scattering tree exceeds the arena capacity.
pub(crate) fn seed_rays(
    ctx: &ModelContext,
    seeds: &[SeedRay],
    settings: &TraceSettings,
) -> TraceResult<Vec<Ray>>
{
    let required = worst_case_tree(seeds, settings.branches.max(1));
    if required > settings.potential_size as u128 {
        return Err(Error::Capacity {
            required,
            capacity: settings.potential_size,
        });
    }

    let mut rays = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let position = GeoPoint::from_depth(seed.theta, seed.depth);

        // First containing polygon wins; region 0 otherwise.
        let mut rid = 0;
        for (k, region) in ctx.regions.iter().enumerate().skip(1) {
            if point_in_polygon(&region.polyline, position, BoundaryRule::Exclude, &region.bounds) {
                rid = k;
                break;
            }
        }

        let s = reference_sample(seed.depth, &ctx.deviations);
        let region = &ctx.regions[rid];
        let v = if seed.comp.is_p() {
            s.vp * region.dvp
        } else {
            s.vs * region.dvs
        };
        let ray_param = DEG2RAD * position.radius * (seed.takeoff.abs() * DEG2RAD).sin() / v;

        rays.push(Ray {
            is_p: seed.comp.is_p(),
            comp: seed.comp,
            go_up: seed.takeoff.abs() >= 90.0,
            go_left: seed.takeoff < 0.0,
            in_region: rid,
            pt: seed.theta,
            pr: position.radius,
            ray_param,
            takeoff: seed.takeoff,
            amp: 1.0,
            travel_time: 0.0,
            travel_dist: 0.0,
            incident: 0.0,
            remaining_legs: seed.steps,
            surfacing: 0,
            prev: None,
            color: seed.color,
            debug: String::new(),
        });
    }
    Ok(rays)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn geometric_sums()
    {
        assert_eq!(geometric_sum(1, 5), 5);
        assert_eq!(geometric_sum(4, 3), 21); // 1 + 4 + 16
        assert_eq!(geometric_sum(2, 200), u128::MAX);
    }
}
