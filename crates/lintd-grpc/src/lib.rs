//! lintd gRPC daemon
//!
//! Exposes the lintd analysis engine over gRPC. A client configures the
//! engine once with `Start`, then each `Analyze` call runs one analysis
//! session whose issues are streamed back as the engine finds them.
//!
//! # Architecture
//!
//! The engine API is synchronous and callback based. Each session runs the
//! engine on a blocking thread with two proxies plugged into its callbacks:
//!
//! - [`IssueProxy`] turns every reported issue into one `Issue` message on
//!   the response stream. A failure to deliver aborts the analysis.
//! - [`LogProxy`] forwards engine log lines to the stream opened by
//!   `StreamLogs`, if any. Delivery is best-effort and never fails the
//!   analysis.
//!
//! # Example Flow
//!
//! ```text
//! Client                                    Server
//! │                                           │
//! │  Start{excluded_rules: [...]}             │
//! │ ─────────────────────────────────────────>│
//! │                                  Empty{}  │
//! │<───────────────────────────────────────── │
//! │                                           │
//! │  StreamLogs{}                             │
//! │ ─────────────────────────────────────────>│
//! │                                           │
//! │  Analyze{files: [...]}                    │
//! │ ─────────────────────────────────────────>│
//! │                                           │
//! │        LogEvent{DEBUG "Analyzing a.txt"}  │  (log stream)
//! │<───────────────────────────────────────── │
//! │                                           │
//! │        Issue{rule_key: "text:..."}        │  (analyze stream)
//! │<───────────────────────────────────────── │
//! │                                           │
//! │        status OK                          │
//! │<───────────────────────────────────────── │
//! ```

pub mod proto {
    #![allow(missing_docs)]
    #![allow(clippy::doc_markdown)]
    tonic::include_proto!("lintd.v1");
}

mod issue_proxy;
mod log_proxy;
mod server;
mod service;
mod session;
mod sink;

pub use issue_proxy::{IssueProxy, to_wire};
pub use log_proxy::LogProxy;
pub use server::{AnalyzerServer, ServerConfig};
pub use service::{AnalyzerService, DEFAULT_LOG_BUFFER, DEFAULT_STREAM_BUFFER};
pub use session::{Session, SessionState, status_for};
pub use sink::{ChannelSink, LossySink, StreamSink};

// Re-export proto types for convenience
pub use proto::{
    AnalysisRequest, StandaloneConfiguration,
    standalone_analyzer_client::StandaloneAnalyzerClient,
    standalone_analyzer_server::StandaloneAnalyzerServer,
};
