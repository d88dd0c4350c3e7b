pub mod common;
pub mod gemini;
pub mod imagen;
pub mod request;
pub mod response;

pub use common::*;
pub use request::*;
pub use response::*;
