//! Backend-neutral types for accelerator latency benchmarking: tensors, model
//! contracts, the backend traits and the shared error taxonomy.

pub mod artifact;
pub mod backend;
pub mod error;
pub mod spec;
pub mod tensor;

pub use artifact::*;
pub use backend::*;
pub use error::*;
pub use spec::*;
pub use tensor::*;
