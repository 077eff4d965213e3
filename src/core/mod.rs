pub mod error;
pub mod value;

pub use error::{ModelError, Result};
pub use value::Value;
