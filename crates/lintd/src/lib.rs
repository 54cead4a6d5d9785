//! lintd: the engine-facing core of the analysis daemon.
//!
//! The daemon wraps an in-process static-analysis engine behind an RPC
//! interface. This crate holds everything the engine itself sees:
//!
//! - [`ClientInputFile`]: a source file handed to the engine, with lazy
//!   content access decoded through its declared [`Charset`]
//! - [`Issue`] and [`IssueListener`]: the synchronous callback the engine
//!   reports findings through
//! - [`LogOutput`]: the logging capability passed explicitly into each
//!   analysis call
//! - [`AnalysisEngine`]: the narrow contract the daemon drives, plus the
//!   small [`BasicEngine`] shipped with the daemon
//!
//! Wire types, proxies and the RPC surface live in `lintd-grpc`.

mod charset;
mod engine;
mod input;
mod issue;
mod log;
mod sink;

pub use charset::{Charset, UnsupportedCharset};
pub use engine::{
    AnalysisConfiguration, AnalysisConfigurationBuilder, AnalysisEngine, AnalysisResults,
    BasicEngine, EngineConfig, EngineError, RuleDetails,
};
pub use input::{ClientInputFile, InputFileError};
pub use issue::{Issue, IssueError, IssueListener, Severity};
pub use log::{Level, LogOutput, TracingLogOutput};
pub use sink::{Sink, SinkError};
