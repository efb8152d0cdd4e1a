pub mod analysis;
pub mod data;
pub mod lines;
pub mod teams;
