pub mod errors;
pub mod id;

pub use errors::{ConfigError, DovboError};
pub use id::{new_correlation_id, ChatId};
