pub mod health;
pub mod diagnostics;
pub mod background;

pub use health::*;
pub use diagnostics::*;
pub use background::*;
