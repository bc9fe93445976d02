pub mod assessment;
pub mod auth;
pub mod enums;
pub mod patient;
pub mod stats;

pub use assessment::*;
pub use auth::*;
pub use enums::*;
pub use patient::*;
pub use stats::*;
