pub mod memory;
pub mod scene;
