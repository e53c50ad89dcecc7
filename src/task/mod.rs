pub mod config;
pub mod registry;
pub mod result;

pub use config::{ConfigField, FieldType, TaskConfig, TaskMetadata};
pub use registry::{ProgressCallback, TaskHandler, TaskRegistry, TaskRequest};
pub use result::{EncodedResultBuilder, ResultBuilder, TaskResult};
