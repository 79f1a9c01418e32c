//! Token data sources and real-time payload parsing.

pub mod error;
pub mod fixed;
pub mod message;
pub mod mock;
pub mod source;

pub use error::{FetchError, MessageError};
pub use fixed::FixedTokenSource;
pub use message::{parse_message, PriceUpdate};
pub use mock::MockTokenSource;
pub use source::TokenSource;
