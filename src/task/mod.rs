pub mod conversion;
pub mod definition;
pub mod document;
pub mod factory;
pub mod kind;

pub use conversion::*;
pub use definition::*;
pub use document::*;
pub use kind::*;
