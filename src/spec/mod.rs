mod build;
mod load;
mod store;
mod types;

pub use build::*;
pub use load::*;
pub use store::*;
pub use types::*;
