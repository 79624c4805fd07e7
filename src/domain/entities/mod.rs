pub mod bar;
pub mod signal;
