pub mod shape;
pub mod messages;
pub mod health;
pub mod background;
pub mod diagnostics;
pub mod error;

pub use shape::*;
pub use messages::*;
pub use health::*;
pub use background::*;
pub use diagnostics::*;
pub use error::*;
