pub mod emotion;
pub mod export;
pub mod feedback;
pub mod generator;
pub mod store;
