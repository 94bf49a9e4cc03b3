pub use crate::coefficients::{Coefficients, InterfaceKind, Polarity, plane_wave_coefficients};
pub use crate::config::{
    DeviationBand, GridSpec, ModelSpec, RegionSpec, ScatterFlags, SeedRay, TraceSettings, WaveComp,
};
pub use crate::error::{Error, TraceResult};
pub use crate::model::{ModelContext, Region, RegionLayers, reference_sample};
pub use crate::propagator::Channel;
pub use crate::ray::Ray;
pub use crate::scheduler::Tracer;
pub use crate::shoot::{Shot, shoot};
pub use crate::sink::TraceOutput;

pub use seistrace_common::prelude::*;
