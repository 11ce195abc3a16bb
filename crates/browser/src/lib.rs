pub mod cookies;
pub mod driver;
pub mod screenshot;
pub mod session;

pub use driver::CdpDriver;
pub use session::{LaunchOptions, Session};
