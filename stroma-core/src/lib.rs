mod model;
mod observer;
mod time;

pub use model::{Model, Snapshot};
pub use observer::Observer;
pub use time::DurationExt;
