pub mod acl;
pub mod classify;
pub mod event;

pub use acl::*;
pub use classify::*;
pub use event::*;
