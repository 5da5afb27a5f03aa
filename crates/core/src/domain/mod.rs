pub mod instrument;
pub mod scoring;
pub mod sentiment;
