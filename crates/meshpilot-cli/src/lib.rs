//! Scene loading and report rendering behind the `meshpilot` binary.

pub mod report;
pub mod scene;

pub use report::{GraphReport, PathReport};
pub use scene::Scene;
