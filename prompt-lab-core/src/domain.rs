pub mod config;
pub mod prompt;
pub mod result;
pub mod test_case;

pub use config::*;
pub use prompt::*;
pub use result::*;
pub use test_case::*;
