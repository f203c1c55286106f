pub mod pipeline;
pub mod target;
