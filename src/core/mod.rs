pub mod processor;
pub mod worker;

pub use crate::domain::model::{CountingResult, InboundMessage};
pub use crate::domain::ports::{MessageSource, Received, ResultRepository};
pub use crate::utils::error::Result;
