pub mod cli;
pub mod document;
pub mod engine;
pub mod error;
pub mod format;
pub mod hash;
pub mod indent;
pub mod inspect;
pub mod language;
pub mod locate;
pub mod patch;
pub mod plan;
pub mod policy;
pub mod request;
pub mod serialize;
pub mod subject;
pub mod write;

pub use document::{FsLoader, MemoryLoader, SourceLoader};
pub use engine::{Engine, FixResult, SkipReason, SkippedFix, apply_fixes};
pub use error::SnapfixError;
pub use format::{CommandFormatter, Formatter};
pub use inspect::{Inspector, LiteralInspector};
pub use policy::Policy;
pub use request::{FixRequest, FixStatus};
pub use subject::Subject;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
