pub mod cancel;
pub mod driver;
pub mod input;
pub mod sink;
pub mod summary;

pub use cancel::*;
pub use driver::*;
pub use input::*;
pub use sink::*;
pub use summary::*;
