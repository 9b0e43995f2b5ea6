pub mod controller;
pub mod csv_loader;
pub mod dtw;
pub mod live_buffer;
pub mod normalizer;
pub mod quality_filter;
pub mod reference_store;
pub mod source;
pub mod types;
