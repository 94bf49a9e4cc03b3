pub use crate::angles::{wrap_180, wrap_360};
pub use crate::consts::*;
pub use crate::geometry::{chord_dist, point_in_polygon, segment_junction, BoundaryRule};
pub use crate::prem::{prem, ElasticSample};
pub use crate::types::{Bounds, Cplx, GeoPoint, Real};
