/// Errors raised while building a model or expanding the ray tree.
#[derive(Debug)]
pub enum Error
{
    /// The worst-case ray tree does not fit in the pre-allocated arena.
    Capacity
    {
        required: u128, capacity: usize
    },
    /// No radial grid spec was given, or a spec had a non-positive increment.
    BadGrid
    {
        index: usize
    },
    /// A region polygon has fewer than three vertices or mismatched
    /// coordinate lists.
    BadPolygon
    {
        region: usize
    },
    /// A leg crossed a region boundary but no polygon edge intersects its
    /// last segment. This breaks an internal invariant and aborts the run.
    NoJunction
    {
        slot: usize
    },
    /// A worker thread disappeared while legs were still outstanding.
    WorkerLost,
}

impl std::fmt::Display for Error
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            Self::Capacity { required, capacity } => write!(
                f,
                "ray arena too small: worst-case tree has {required} rays, \
                 capacity is {capacity}; lower the leg count or seed fewer rays"
            ),
            Self::BadGrid { index } => {
                write!(f, "radial grid spec #{index} is empty or has a non-positive increment")
            }
            Self::BadPolygon { region } => {
                write!(f, "region #{region} polygon needs at least 3 vertices")
            }
            Self::NoJunction { slot } => {
                write!(f, "ray #{slot}: no polygon edge intersects the crossing segment")
            }
            Self::WorkerLost => write!(f, "a propagator worker exited unexpectedly"),
        }
    }
}

impl std::error::Error for Error {}

pub type TraceResult<T> = Result<T, Error>;
