pub mod geometry;
pub mod scheduler;
pub mod sink;
