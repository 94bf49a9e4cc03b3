use crate::ray::Ray;
use seistrace_common::prelude::*;

/// The complete product of one trace, one entry per ray head in arena order.
///
/// `ray_info` carries the per-leg summary line, `paths` the leg polyline and
/// `reach_surfaces` the surface-arrival record (empty for legs that did not
/// end at the free surface). `regions` holds the rectified patch outlines for
/// display; entry 0, the 1D reference, is empty.
#[derive(Clone, Debug)]
pub struct TraceOutput
{
    pub ray_info: Vec<String>,
    pub paths: Vec<Vec<GeoPoint>>,
    pub reach_surfaces: Vec<String>,
    pub regions: Vec<Vec<GeoPoint>>,
    pub rays: Vec<Ray>,
    pub ray_count: usize,
    /// Residual of the remaining-work estimate after all forfeited branches
    /// were deducted.
    pub estimation: i64,
}

impl TraceOutput
{
    /// Iterator over the non-empty surface-arrival records.
    pub fn arrivals(&self) -> impl Iterator<Item = &str>
    {
        self.reach_surfaces
            .iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
    }
}

/// Pre-allocated per-slot output buffers, written once per slot by the
/// scheduler as leg outcomes are committed.
pub(crate) struct Sink
{
    ray_info: Vec<String>,
    paths: Vec<Vec<GeoPoint>>,
    reach_surfaces: Vec<String>,
}

impl Sink
{
    pub fn new(capacity: usize) -> Self
    {
        Self {
            ray_info: vec![String::new(); capacity],
            paths: vec![Vec::new(); capacity],
            reach_surfaces: vec![String::new(); capacity],
        }
    }

    pub fn write_leg(&mut self, slot: usize, info: String, path: Vec<GeoPoint>)
    {
        self.ray_info[slot] = info;
        self.paths[slot] = path;
    }

    pub fn write_arrival(&mut self, slot: usize, record: String)
    {
        self.reach_surfaces[slot] = record;
    }

    pub fn finalize(
        mut self,
        rays: Vec<Ray>,
        regions: Vec<Vec<GeoPoint>>,
        estimation: i64,
    ) -> TraceOutput
    {
        let ray_count = rays.len();
        self.ray_info.truncate(ray_count);
        self.paths.truncate(ray_count);
        self.reach_surfaces.truncate(ray_count);
        TraceOutput {
            ray_info: self.ray_info,
            paths: self.paths,
            reach_surfaces: self.reach_surfaces,
            regions,
            rays,
            ray_count,
            estimation,
        }
    }
}
