pub mod resolver;

pub use resolver::{InputFile, InputResolver, PipedInputResolver};
