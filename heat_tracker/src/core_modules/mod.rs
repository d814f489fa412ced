pub mod bbox;
pub mod blob;
pub mod blob_detector;
pub mod centroid;
pub mod classifier;
pub mod heatmap;
pub mod render;
pub mod tracker;
pub mod utils;
pub mod window_search;
