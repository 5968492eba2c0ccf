#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, write_counts_png, write_intensity_png, ImageConfig, Stretch};
