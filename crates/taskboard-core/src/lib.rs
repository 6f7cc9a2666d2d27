pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use config::AppConfig;
pub use error::{TaskboardError, ValidationError};
pub use result::TaskboardResult;
pub use traits::{Clock, FixedClock, SystemClock};
