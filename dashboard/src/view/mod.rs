pub mod digest;
pub mod filter;
pub mod format;
pub mod render;
