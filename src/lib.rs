pub mod args;
pub mod comments;
pub mod config;
pub mod dataset;
pub mod error;
pub mod mock;
pub mod plot;
pub mod transient;
pub mod util;

pub use error::TruncateError;
pub use transient::{remove_transient, truncate_transient, Outcome, Truncation};
