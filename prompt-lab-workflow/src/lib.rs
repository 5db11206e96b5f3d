pub mod benchmark;
pub mod client;
pub mod harness;
pub mod reporting;
pub mod runner;
pub mod tasks;

pub use benchmark::*;
pub use client::*;
pub use harness::*;
pub use reporting::*;
pub use runner::*;
pub use tasks::*;
