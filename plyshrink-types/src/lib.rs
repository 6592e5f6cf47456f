pub mod error;
pub mod field;
pub mod header;
pub mod report;
pub mod sample;

pub use error::*;
pub use field::*;
pub use header::*;
pub use report::*;
pub use sample::*;
