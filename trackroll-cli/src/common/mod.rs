pub mod util;

pub use util::parse_segment_specs;
