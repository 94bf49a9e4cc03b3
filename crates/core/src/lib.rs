pub mod coefficients;
pub mod config;
pub mod error;
pub mod model;
pub mod prelude;
pub mod propagator;
pub mod ray;
pub mod scheduler;
mod seed;
pub mod shoot;
pub mod sink;

#[cfg(test)]
mod tests
{
    use crate::prelude::*;

    fn whole_earth() -> ModelSpec
    {
        ModelSpec {
            grid: vec![GridSpec {
                depth_from: 0.0,
                depth_to: 6371.0,
                increment: 50.0,
            }],
            special_depths: Vec::new(),
            deviations: Vec::new(),
            regions: Vec::new(),
        }
    }

    fn settings(potential_size: usize, scatter: ScatterFlags) -> TraceSettings
    {
        TraceSettings {
            n_thread: 2,
            branches: 4,
            potential_size,
            stop_at_surface: false,
            rectify_limit: 1.0,
            scatter,
        }
    }

    const NO_SCATTER: ScatterFlags = ScatterFlags {
        ts: false,
        td: false,
        rs: false,
        rd: false,
    };

    #[test]
    fn straight_down_ray_stops_at_the_first_discontinuity()
    {
        let tracer = Tracer::new(&whole_earth(), settings(8, NO_SCATTER)).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::P,
                steps: 1,
                color: 1,
                theta: 0.0,
                depth: 0.0,
                takeoff: 0.0,
            }])
            .unwrap();

        assert_eq!(out.ray_count, 1);
        assert!(out.paths[0].len() >= 2);
        assert_eq!(out.paths[0][0], GeoPoint::new(0.0, EARTH_RADIUS_KM));
        assert_eq!(out.paths[0].last().unwrap().radius, CMB_RADIUS_KM);
        assert!(out.reach_surfaces[0].is_empty());
        assert!(out.ray_info[0].contains("sec."));
        assert!((out.rays[0].incident).abs() < 1e-9);
    }

    #[test]
    fn surface_reflection_spawns_one_arrival()
    {
        let flags = ScatterFlags { rs: true, ..NO_SCATTER };
        let tracer = Tracer::new(&whole_earth(), settings(32, flags)).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::P,
                steps: 2,
                color: 0,
                theta: 0.0,
                depth: 100.0,
                takeoff: 170.0,
            }])
            .unwrap();

        assert_eq!(out.ray_count, 2);
        let arrivals: Vec<&str> = out.arrivals().collect();
        assert_eq!(arrivals.len(), 1);
        assert!(arrivals[0].contains('p'));

        // The free surface is hit at exactly the model radius, no epsilon.
        assert_eq!(out.paths[0].last().unwrap().radius, EARTH_RADIUS_KM);

        // The reflected child heads back down with a surface-flipped sign.
        let child = &out.rays[1];
        assert_eq!(child.prev, Some(0));
        assert!(!child.go_up);
        assert!(child.amp < 0.0);
        assert_eq!(child.remaining_legs, 0);
    }

    #[test]
    fn stop_at_surface_forfeits_the_descendants()
    {
        let flags = ScatterFlags { rs: true, ..NO_SCATTER };
        let tracer =
            Tracer::new(&whole_earth(), settings(32, flags).stopping_at_surface()).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::P,
                steps: 2,
                color: 0,
                theta: 0.0,
                depth: 100.0,
                takeoff: 170.0,
            }])
            .unwrap();

        assert_eq!(out.ray_count, 1);
        assert_eq!(out.arrivals().count(), 1);
        // branches * (1 + ... + branches^(remaining-1)) with one leg left.
        assert_eq!(out.estimation, 32 - 4);
    }

    #[test]
    fn cmb_splits_p_into_transmission_and_reflection()
    {
        let flags = ScatterFlags {
            ts: true,
            rs: true,
            ..NO_SCATTER
        };
        let tracer = Tracer::new(&whole_earth(), settings(32, flags)).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::P,
                steps: 2,
                color: 0,
                theta: 0.0,
                depth: 2800.0,
                takeoff: 10.0,
            }])
            .unwrap();

        assert_eq!(out.ray_count, 3);
        assert_eq!(out.paths[0].last().unwrap().radius, CMB_RADIUS_KM);

        // Emission order is transmission first, then reflection; both stay P
        // because S cannot enter the fluid outer core.
        let (ts, rs) = (&out.rays[1], &out.rays[2]);
        assert!(ts.is_p && rs.is_p);
        assert!(!ts.go_up);
        assert!(rs.go_up);
        assert_eq!(ts.pr, CMB_RADIUS_KM);
        assert_eq!(rs.pr, CMB_RADIUS_KM);

        // Horizontal interface: the ray parameter is conserved on every
        // channel.
        assert_eq!(ts.ray_param, out.rays[0].ray_param);
        assert_eq!(rs.ray_param, out.rays[0].ray_param);

        // Each committed child sits one leg below its parent's budget.
        for child in &out.rays[1..] {
            let parent = &out.rays[child.prev.unwrap()];
            assert_eq!(child.remaining_legs, parent.remaining_legs - 1);
        }

        // The reflected branch comes back up and reports a two-leg phase.
        let arrivals: Vec<&str> = out.arrivals().collect();
        assert_eq!(arrivals.len(), 1);
        assert!(arrivals[0].contains("P->p"));
        assert!(arrivals[0].contains("1->3"));
    }

    #[test]
    fn turning_leg_reflects_only_same_type()
    {
        let tracer = Tracer::new(&whole_earth(), settings(32, ScatterFlags::default())).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::Sv,
                steps: 2,
                color: 0,
                theta: 0.0,
                depth: 300.0,
                takeoff: 45.0,
            }])
            .unwrap();

        // All four channels were allowed, but the turned leg forfeits
        // everything except the same-type reflection.
        assert_eq!(out.ray_count, 2);
        let child = &out.rays[1];
        assert!(!child.is_p);
        assert!(child.go_up);
        assert_eq!(child.amp, 1.0);
        assert!(out.paths[0].last().unwrap().radius > CMB_RADIUS_KM);

        let arrivals: Vec<&str> = out.arrivals().collect();
        assert_eq!(arrivals.len(), 1);
        assert!(arrivals[0].contains("S->s"));
    }

    #[test]
    fn leg_crossing_into_a_patch_updates_region_and_ray_parameter()
    {
        let mut spec = whole_earth();
        spec.regions.push(RegionSpec::from_depths(
            &[0.1, 3.0, 3.0, 0.1],
            &[200.0, 200.0, 500.0, 500.0],
            -5.0,
            0.0,
            0.0,
        ));
        let flags = ScatterFlags { ts: true, ..NO_SCATTER };
        let tracer = Tracer::new(&spec, settings(32, flags)).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::P,
                steps: 2,
                color: 0,
                theta: -0.15,
                depth: 300.0,
                takeoff: 15.0,
            }])
            .unwrap();

        assert_eq!(out.ray_count, 2);

        // The parent leg ends on the last sample still outside the patch.
        let last = out.paths[0].last().unwrap();
        assert!(last.theta < 0.1);

        // The transmitted child starts inside the patch with a ray parameter
        // refracted by the perturbed velocity across the tilted wall.
        let child = &out.rays[1];
        assert_eq!(child.prev, Some(0));
        assert_eq!(child.in_region, 1);
        assert!(child.pt > 0.1);
        assert!(child.pr < EARTH_RADIUS_KM - 200.0 && child.pr > EARTH_RADIUS_KM - 500.0);
        assert!((child.ray_param - out.rays[0].ray_param).abs() > 1e-12);
    }

    #[test]
    fn capacity_overflow_fails_before_dispatch()
    {
        let tracer = Tracer::new(&whole_earth(), settings(100, ScatterFlags::default())).unwrap();
        let seeds: Vec<SeedRay> = (0..10)
            .map(|i| SeedRay {
                comp: WaveComp::P,
                steps: 10,
                color: i,
                theta: 0.0,
                depth: 100.0,
                takeoff: 10.0,
            })
            .collect();

        match tracer.trace(&seeds) {
            Err(Error::Capacity { required, capacity }) => {
                assert_eq!(capacity, 100);
                assert!(required > 100);
            }
            other => panic!("expected a capacity error, got {other:?}"),
        }
    }

    #[test]
    fn seed_already_at_its_window_edge_is_trivial()
    {
        let tracer = Tracer::new(&whole_earth(), settings(128, ScatterFlags::default())).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::P,
                steps: 3,
                color: 0,
                theta: 0.0,
                depth: 0.0,
                takeoff: 170.0,
            }])
            .unwrap();

        // An up-going seed at the surface has nowhere to go: the leg is
        // trivial, nothing is written and no children spawn.
        assert_eq!(out.ray_count, 1);
        assert!(out.paths[0].is_empty());
        assert!(out.ray_info[0].is_empty());
        assert_eq!(out.rays[0].remaining_legs, 0);
    }

    #[test]
    fn negative_takeoff_mirrors_the_path()
    {
        let tracer = Tracer::new(&whole_earth(), settings(32, NO_SCATTER)).unwrap();
        let seed = |takeoff| SeedRay {
            comp: WaveComp::Sv,
            steps: 1,
            color: 0,
            theta: 0.0,
            depth: 300.0,
            takeoff,
        };
        let out = tracer.trace(&[seed(45.0), seed(-45.0)]).unwrap();

        assert_eq!(out.ray_count, 2);
        assert!(out.rays[1].go_left);
        assert_eq!(out.paths[0].len(), out.paths[1].len());
        for (right, left) in out.paths[0].iter().zip(&out.paths[1]) {
            assert_eq!(right.theta, -left.theta);
            assert_eq!(right.radius, left.radius);
        }
    }

    #[test]
    fn sh_rays_never_convert()
    {
        let tracer = Tracer::new(&whole_earth(), settings(128, ScatterFlags::default())).unwrap();
        let out = tracer
            .trace(&[SeedRay {
                comp: WaveComp::Sh,
                steps: 3,
                color: 0,
                theta: 0.0,
                depth: 100.0,
                takeoff: 20.0,
            }])
            .unwrap();

        assert!(out.ray_count >= 2);
        for ray in &out.rays {
            assert_eq!(ray.comp, WaveComp::Sh);
            assert!(!ray.is_p);
        }
    }
}
