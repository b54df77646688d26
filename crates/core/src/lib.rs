pub mod message;
pub mod rejection;
pub mod transaction;

pub use message::RawMessage;
pub use rejection::{RejectReason, RejectionEntry};
pub use transaction::{BuildPolicy, ExtractedFields, TransactionRecord};
