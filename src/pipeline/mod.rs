// Pipeline processing: reshaping Insights events into Chronicle records

pub mod normalize;

pub use normalize::{transform_event, transform_events};
