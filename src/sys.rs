pub mod display;
pub mod geometry;
