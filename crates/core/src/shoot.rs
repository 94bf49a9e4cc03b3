use seistrace_common::prelude::*;

/// Result of shooting one leg downward through a layer stack.
///
/// `degrees` holds the cumulative angular distance from the shot origin at
/// each sampled layer; `last_index` is the layer index of the final sample.
/// A result with fewer than two samples is a trivial leg.
#[derive(Clone, Debug)]
pub struct Shot
{
    pub time: Real,
    pub dist: Real,
    pub degrees: Vec<Real>,
    pub last_index: usize,
    pub turned: bool,
}

/// Shoot a ray of parameter `ray_param` (sec/deg) through the layers of one
/// region, from depth `top` down to depth `bot`.
///
/// Within each shell the velocity is constant, so the path is the straight
/// chord between the bounding radii and the Snell invariant `p = r sin i / v`
/// carries the incidence from shell to shell. The shot stops at the window
/// bottom, or earlier when the incidence passes the turning threshold.
/// Up-going legs are shot through the same window and reversed by the caller.
#[must_use]
pub fn shoot(radii: &[Real], vel: &[Real], ray_param: Real, top: Real, bot: Real) -> Shot
{
    let r_hi = EARTH_RADIUS_KM - top;
    let r_lo = EARTH_RADIUS_KM - bot;
    let p = ray_param * RAD2DEG; // sec/rad

    let start = radii.partition_point(|&r| r > r_hi);
    let stop = radii.partition_point(|&r| r >= r_lo);

    let mut shot = Shot {
        time: 0.0,
        dist: 0.0,
        degrees: Vec::new(),
        last_index: start.min(radii.len().saturating_sub(1)),
        turned: false,
    };
    if start >= stop {
        return shot;
    }

    let sin_turn = (TURNING_INCIDENCE_DEG * DEG2RAD).sin();
    let mut cum_deg = 0.0;
    shot.degrees.push(cum_deg);
    shot.last_index = start;

    for i in start..stop - 1 {
        let v = vel[i + 1];
        if v < 1e-9 {
            break;
        }
        let (r1, r2) = (radii[i], radii[i + 1]);
        let sin1 = p * v / r1;
        let sin2 = p * v / r2;
        if sin1 >= 1.0 || sin2 >= sin_turn {
            shot.turned = true;
            break;
        }

        let chord = r1 * (1.0 - sin1 * sin1).sqrt() - (r2 * r2 - r1 * r1 * sin1 * sin1).sqrt();
        let cos_span = ((r1 * r1 + r2 * r2 - chord * chord) / (2.0 * r1 * r2)).clamp(-1.0, 1.0);
        cum_deg += cos_span.acos() * RAD2DEG;

        shot.time += chord / v;
        shot.dist += chord;
        shot.degrees.push(cum_deg);
        shot.last_index = i + 1;
    }

    shot
}

#[cfg(test)]
mod tests
{
    use super::*;

    // Surface to CMB with PREM mantle velocities on a coarse grid.
    fn mantle_stack() -> (Vec<Real>, Vec<Real>)
    {
        let radii: Vec<Real> = (0..=58)
            .map(|k| EARTH_RADIUS_KM - 50.0 * k as Real)
            .map(|r| r.max(CMB_RADIUS_KM))
            .collect();
        let vp = radii.iter().map(|&r| prem(EARTH_RADIUS_KM - r).vp).collect();
        (radii, vp)
    }

    #[test]
    fn vertical_ray_goes_straight_down()
    {
        let (radii, vp) = mantle_stack();
        let shot = shoot(&radii, &vp, 0.0, 0.0, 2891.0);

        assert!(!shot.turned);
        assert!(shot.degrees.len() > 50);
        assert!(shot.degrees.iter().all(|&d| d == 0.0));
        assert!((shot.dist - 2891.0).abs() < 50.0 + 1e-9);
        assert!(shot.time > 0.0);
        assert_eq!(shot.last_index, shot.degrees.len() - 1);
    }

    #[test]
    fn steep_ray_reaches_the_window_bottom()
    {
        let (radii, vp) = mantle_stack();
        // 10 degrees off vertical at the surface.
        let p = DEG2RAD * EARTH_RADIUS_KM * (10.0 * DEG2RAD).sin() / 5.8;
        let shot = shoot(&radii, &vp, p, 0.0, 2891.0);

        assert!(!shot.turned);
        assert!(shot.degrees.windows(2).all(|w| w[0] < w[1]));
        assert!(shot.dist > 2891.0);
    }

    #[test]
    fn grazing_ray_turns_in_the_mantle()
    {
        let (radii, vp) = mantle_stack();
        let p = DEG2RAD * EARTH_RADIUS_KM * (60.0 * DEG2RAD).sin() / 5.8;
        let shot = shoot(&radii, &vp, p, 0.0, 2891.0);

        assert!(shot.turned);
        let end = radii[shot.last_index];
        assert!(end > CMB_RADIUS_KM);
    }

    #[test]
    fn empty_window_is_trivial()
    {
        let (radii, vp) = mantle_stack();
        let shot = shoot(&radii, &vp, 0.0, 100.0, 100.0);
        assert!(shot.degrees.len() <= 1);
    }
}
