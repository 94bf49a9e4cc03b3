use crate::config::{ModelSpec, SeedRay, TraceSettings};
use crate::error::{Error, TraceResult};
use crate::model::ModelContext;
use crate::propagator::{LegOutcome, LegReport, follow_ray};
use crate::ray::Ray;
use crate::seed::{geometric_sum, seed_rays};
use crate::sink::{Sink, TraceOutput};
use crossbeam::channel;
use itertools::Itertools;
use seistrace_common::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};

/// Owns the model, the runtime settings and the worker pool that expands the
/// reflection/transmission tree breadth-parallel.
///
/// Ray heads live in one append-only arena; a fixed pool of workers follows
/// one leg at a time and the scheduler commits each outcome in turn, so every
/// arena slot has exactly one writer and children only ever reference fully
/// written ancestors.
pub struct Tracer
{
    ctx: ModelContext,
    settings: TraceSettings,
    observer: Arc<AtomicIsize>,
}

impl Tracer
{
    pub fn new(model: &ModelSpec, settings: TraceSettings) -> TraceResult<Self>
    {
        let ctx = ModelContext::build(model, settings.rectify_limit)?;
        Ok(Self {
            ctx,
            settings,
            observer: Arc::new(AtomicIsize::new(0)),
        })
    }

    #[must_use]
    pub fn model(&self) -> &ModelContext
    {
        &self.ctx
    }

    /// Liveness counter: the dispatch index minus the pool size, updated as
    /// legs are handed out. Poll it from another thread to watch progress.
    #[must_use]
    pub fn observer(&self) -> Arc<AtomicIsize>
    {
        Arc::clone(&self.observer)
    }

    /// Expand the full scattering tree of `seeds` and collect every leg's
    /// output.
    pub fn trace(&self, seeds: &[SeedRay]) -> TraceResult<TraceOutput>
    {
        let settings = &self.settings;
        let mut rays = seed_rays(&self.ctx, seeds, settings)?;
        let mut sink = Sink::new(settings.potential_size);
        let mut estimation = settings.potential_size as i64;

        let n_thread = settings.n_thread.max(1);
        let (job_tx, job_rx) = channel::unbounded::<(usize, Ray)>();
        let (res_tx, res_rx) = channel::unbounded::<(usize, TraceResult<LegOutcome>)>();

        let ctx = &self.ctx;
        let flags = settings.scatter;

        std::thread::scope(|scope| -> TraceResult<()> {
            for _ in 0..n_thread {
                let jobs = job_rx.clone();
                let results = res_tx.clone();
                scope.spawn(move || {
                    for (slot, head) in jobs.iter() {
                        if results.send((slot, follow_ray(ctx, &flags, slot, &head))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(res_tx);
            drop(job_rx);

            let mut doing = 0;
            let mut outstanding = 0;
            while doing < rays.len() || outstanding > 0 {
                while outstanding < n_thread && doing < rays.len() {
                    job_tx
                        .send((doing, rays[doing].clone()))
                        .map_err(|_| Error::WorkerLost)?;
                    doing += 1;
                    outstanding += 1;
                    self.observer
                        .store(doing as isize - n_thread as isize, Ordering::Relaxed);
                }

                let (slot, outcome) = res_rx.recv().map_err(|_| Error::WorkerLost)?;
                outstanding -= 1;
                self.commit(slot, outcome?, &mut rays, &mut sink, &mut estimation)?;
            }
            drop(job_tx);
            Ok(())
        })?;

        Ok(sink.finalize(rays, self.ctx.region_outlines(), estimation))
    }

    /// Fold one leg outcome back into the arena: update the head, write its
    /// output slots, append its children and keep the remaining-work estimate
    /// exact.
    fn commit(
        &self,
        slot: usize,
        outcome: LegOutcome,
        rays: &mut Vec<Ray>,
        sink: &mut Sink,
        estimation: &mut i64,
    ) -> TraceResult<()>
    {
        let report: Box<LegReport> = match outcome {
            LegOutcome::Skipped => return Ok(()),
            LegOutcome::Trivial => {
                rays[slot].remaining_legs = 0;
                return Ok(());
            }
            LegOutcome::Completed(report) => report,
        };
        let settings = &self.settings;

        {
            let head = &mut rays[slot];
            head.travel_time = report.travel_time;
            head.travel_dist = report.travel_dist;
            head.incident = report.incident;
            head.remaining_legs -= 1;
            if report.surfaced {
                head.surfacing += 1;
            }
            if log::log_enabled!(log::Level::Debug) {
                head.debug.push_str(&format!("{} --> ", slot + 1));
                log::debug!("ray {slot}: lineage {}", head.debug);
            }
        }

        let head = &rays[slot];
        sink.write_leg(
            slot,
            format!(
                "{} {} {:.prec$} sec. {:.prec$} IncDeg. {:.prec$} DispAmp. {:.prec$} km.",
                head.color,
                if head.is_p { "P" } else { "S" },
                head.travel_time,
                head.incident,
                head.amp,
                head.travel_dist,
                prec = DISPLAY_PREC,
            ),
            report.path,
        );

        let branches = settings.branches.max(1) as i64;
        let z = geometric_sum(branches as u128, u128::from(head.remaining_legs))
            .min(i64::MAX as u128) as i64;

        if report.surfaced && (!settings.stop_at_surface || head.surfacing < 2) {
            let record = self.arrival_record(slot, rays, report.surface_theta);
            sink.write_arrival(slot, record);
            if settings.stop_at_surface {
                *estimation -= branches.saturating_mul(z);
                return Ok(());
            }
        }
        if rays[slot].remaining_legs == 0 {
            return Ok(());
        }

        for child in &report.children {
            if rays.len() >= settings.potential_size {
                return Err(Error::Capacity {
                    required: rays.len() as u128 + 1,
                    capacity: settings.potential_size,
                });
            }
            let mut ray = rays[slot].clone();
            ray.is_p = child.is_p;
            ray.comp = child.comp;
            ray.prev = Some(slot);
            ray.pt = child.position.theta;
            ray.pr = child.position.radius;
            ray.ray_param = child.ray_param;
            ray.takeoff = child.takeoff;
            ray.go_up = child.takeoff.abs() > 90.0;
            ray.go_left = child.takeoff < 0.0;
            ray.in_region = child.in_region;
            let c = child.coefficient;
            let sign = if c.im == 0.0 && c.re < 0.0 { -1.0 } else { 1.0 };
            ray.amp *= sign * c.norm();
            log::trace!(
                "ray {}: {} child of {slot}, takeoff {} deg, rayp {}",
                rays.len(),
                child.channel,
                child.takeoff,
                child.ray_param,
            );
            rays.push(ray);
        }
        *estimation -= i64::from(report.forfeited).saturating_mul(z);
        Ok(())
    }

    /// Walk the `prev` chain back to the seed and produce the one-line
    /// surface-arrival record: seed take-off, ray parameter, incidence,
    /// surfacing position, accumulated travel time, amplitude, remaining leg
    /// budget, phase code and the 1-based id chain.
    fn arrival_record(&self, slot: usize, rays: &[Ray], surface_theta: Real) -> String
    {
        let mut chain = vec![slot];
        let mut total_time = rays[slot].travel_time;
        let mut cursor = rays[slot].prev;
        while let Some(i) = cursor {
            chain.push(i);
            total_time += rays[i].travel_time;
            cursor = rays[i].prev;
        }
        chain.reverse();

        let head = &rays[slot];
        let seed = &rays[chain[0]];
        let phases = chain.iter().map(|&i| rays[i].phase_letter()).join("->");
        let ids = chain.iter().map(|&i| (i + 1).to_string()).join("->");
        format!(
            "{} {} {} {} {} {} {} {phases} {ids}",
            seed.takeoff,
            head.ray_param,
            head.incident,
            surface_theta,
            total_time,
            head.amp,
            head.remaining_legs,
        )
    }
}
