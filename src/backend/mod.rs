//! Key-value backend implementations.

#[cfg(feature = "dynamodb")]
pub mod dynamo;
pub mod memory;

#[cfg(feature = "dynamodb")]
pub use dynamo::DynamoDbBackend;
pub use memory::MemoryBackend;
