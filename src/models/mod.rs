pub mod comparison;
pub mod error;
pub mod metrics;
pub mod period;
pub mod tier;

pub use comparison::*;
pub use error::*;
pub use metrics::*;
pub use period::*;
pub use tier::*;
