//! The visitor-driven traversal layer: a capability-bundle callback
//! trait, the path-stack the driver maintains while walking, and the
//! driver itself.

pub mod callbacks;
pub mod driver;
pub mod path;

pub use callbacks::{ArrayEntry, ScalarColumn, VisitPolicy, VisitorCallbacks};
pub use driver::drive;
pub use path::{Path, PathFrame, PathGuard};
