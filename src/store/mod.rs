// src/store/mod.rs
//
// All SQL lives here, as free functions over `impl SqliteExecutor<'_>` so
// the same query runs against a pool or inside an open transaction.

pub mod questions;
pub mod quizzes;
pub mod submissions;
