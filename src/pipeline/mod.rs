pub mod extraction;
pub mod pipeline;
