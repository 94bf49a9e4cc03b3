use crate::config::WaveComp;
use seistrace_common::prelude::*;

/// One node of the reflection/transmission tree. A ray head describes the
/// state of a wavefront at the start of its next leg; after its leg has been
/// followed it also carries that leg's travel time, distance and incidence.
#[derive(Clone, Debug)]
pub struct Ray
{
    pub is_p: bool,
    pub comp: WaveComp,
    pub go_up: bool,
    pub go_left: bool,
    pub in_region: usize,
    /// Angular position, degrees.
    pub pt: Real,
    /// Radius, km.
    pub pr: Real,
    /// Ray parameter, sec/deg.
    pub ray_param: Real,
    /// Takeoff angle at this node, degrees.
    pub takeoff: Real,
    /// Signed product of the interface coefficients accumulated so far.
    pub amp: Real,
    /// Travel time of the last followed leg, sec.
    pub travel_time: Real,
    /// Travel distance of the last followed leg, km.
    pub travel_dist: Real,
    /// Incidence angle at the end of the last followed leg, degrees.
    pub incident: Real,
    pub remaining_legs: u32,
    /// Free-surface hits so far along this branch.
    pub surfacing: u32,
    /// Arena index of the parent ray head.
    pub prev: Option<usize>,
    pub color: i32,
    /// Lineage string, maintained when debug logging is enabled.
    pub debug: String,
}

impl Ray
{
    /// Phase-code letter of this leg: lowercase when going up.
    #[must_use]
    pub const fn phase_letter(&self) -> char
    {
        match (self.is_p, self.go_up) {
            (true, true) => 'p',
            (true, false) => 'P',
            (false, true) => 's',
            (false, false) => 'S',
        }
    }

    #[must_use]
    pub const fn position(&self) -> GeoPoint
    {
        GeoPoint::new(self.pt, self.pr)
    }
}
