pub mod label;
pub mod math_reasoning;

pub use label::*;
pub use math_reasoning::*;
