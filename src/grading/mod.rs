// src/grading/mod.rs

pub mod judge;
pub mod scoring;
