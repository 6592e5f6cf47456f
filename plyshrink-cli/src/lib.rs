pub mod compress;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;

pub use compress::*;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use pipeline::*;
