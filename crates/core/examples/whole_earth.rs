#![allow(clippy::unwrap_used)]
use seistrace_core::prelude::*;

/// Trace a small fan of P rays through PREM with one slow patch in the upper
/// mantle, and print every arrival that makes it back to the surface.
fn main()
{
    pretty_env_logger::init();

    let model = ModelSpec {
        grid: vec![
            GridSpec {
                depth_from: 0.0,
                depth_to: 800.0,
                increment: 10.0,
            },
            GridSpec {
                depth_from: 800.0,
                depth_to: 6371.0,
                increment: 50.0,
            },
        ],
        special_depths: vec![410.0, 660.0],
        deviations: Vec::new(),
        regions: vec![RegionSpec::from_depths(
            &[5.0, 9.0, 9.0, 5.0],
            &[100.0, 100.0, 600.0, 600.0],
            -3.0,
            -3.0,
            0.0,
        )],
    };

    let settings = TraceSettings::default()
        .with_capacity(1 << 16)
        .with_scatter(ScatterFlags {
            ts: true,
            td: false,
            rs: true,
            rd: false,
        })
        .stopping_at_surface();

    let tracer = Tracer::new(&model, settings).unwrap();

    let seeds: Vec<SeedRay> = (1..8)
        .map(|i| SeedRay {
            comp: WaveComp::P,
            steps: 5,
            color: i,
            theta: 0.0,
            depth: 50.0,
            takeoff: 5.0 * i as Real,
        })
        .collect();

    let out = tracer.trace(&seeds).unwrap();

    println!("{} rays traced, estimation residual {}", out.ray_count, out.estimation);
    println!("surface arrivals:");
    for arrival in out.arrivals() {
        println!("  {arrival}");
    }
}
