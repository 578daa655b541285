pub mod backend;
pub mod cpu;
pub mod filter;
pub mod scene;
