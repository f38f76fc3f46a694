pub mod event;
pub mod observation;
pub mod prediction;
pub mod segment;
pub mod series;
pub mod time;

pub use event::*;
pub use observation::*;
pub use prediction::*;
pub use segment::*;
pub use series::{Measurement, SeriesFilter};
pub use time::*;
