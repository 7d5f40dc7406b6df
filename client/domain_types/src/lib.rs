pub mod errors;
pub mod subscription;
pub mod types;
