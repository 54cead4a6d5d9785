//! One analysis request, from engine invocation to stream termination.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lintd::{AnalysisConfiguration, AnalysisEngine, EngineError, IssueError, Sink};
use tonic::Status;

use crate::issue_proxy::IssueProxy;
use crate::log_proxy::LogProxy;
use crate::proto;
use crate::sink::StreamSink;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, engine not yet invoked
    Idle,
    /// Engine call in progress
    Running,
    /// Engine returned; the issue stream was completed
    Completed,
    /// Engine failed; the issue stream was ended with an error status
    Failed,
}

/// A single analysis run.
///
/// Every session gets its own proxies. [`run`](Self::run) is blocking: the
/// engine executes on the calling thread and its callbacks fire there, in
/// the order the engine reports them.
pub struct Session {
    id: u64,
    state: SessionState,
    log_sink: Option<Arc<dyn Sink<proto::LogEvent>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("log_attached", &self.log_sink.is_some())
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an idle session with no log sink.
    pub fn new() -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            state: SessionState::Idle,
            log_sink: None,
        }
    }

    /// Forward engine log lines to `sink` during this session.
    pub fn with_log_sink(mut self, sink: Arc<dyn Sink<proto::LogEvent>>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Session id, unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the engine over `config`, streaming issues to `issues`.
    ///
    /// `issues` is terminated exactly once: completed if the engine returns
    /// normally, failed with the matching status otherwise.
    pub fn run<E, S>(
        mut self,
        engine: &E,
        config: &AnalysisConfiguration<String>,
        issues: S,
    ) -> SessionState
    where
        E: AnalysisEngine,
        S: StreamSink<proto::Issue>,
    {
        self.transition(SessionState::Running);

        let outcome = {
            let mut issue_proxy = IssueProxy::new(&issues);
            let mut log_proxy = LogProxy::new();
            if let Some(sink) = self.log_sink.take() {
                log_proxy.attach(sink);
            }
            engine.analyze(config, &mut issue_proxy, &log_proxy)
        };

        match outcome {
            Ok(results) => {
                tracing::info!(
                    session = self.id,
                    files = results.file_count,
                    failed = results.failed_files.len(),
                    "analysis completed"
                );
                issues.complete();
                self.transition(SessionState::Completed);
            }
            Err(e) => {
                tracing::warn!(session = self.id, "analysis failed: {}", e);
                issues.fail(status_for(&e));
                self.transition(SessionState::Failed);
            }
        }
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(session = self.id, from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }
}

/// The status an engine error is reported to the caller with.
pub fn status_for(err: &EngineError) -> Status {
    match err {
        EngineError::Listener(IssueError::Sink(e)) => {
            Status::unavailable(format!("issue stream unavailable: {}", e))
        }
        EngineError::Listener(IssueError::InvalidSeverity(label)) => {
            Status::internal(format!("engine reported invalid severity {:?}", label))
        }
        EngineError::Config(msg) => Status::invalid_argument(msg.clone()),
        EngineError::Failure(msg) => Status::internal(format!("engine failure: {}", msg)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use lintd::{
        AnalysisResults, BasicEngine, Charset, ClientInputFile, EngineConfig, IssueListener,
        Level, LogOutput, RuleDetails, SinkError,
    };
    use tonic::Code;

    use crate::sink::testing::RecordingSink;

    /// Engine that replays a fixed script of issues and log lines.
    struct ScriptedEngine {
        severities: Vec<&'static str>,
        fail_with: Option<&'static str>,
    }

    impl AnalysisEngine for ScriptedEngine {
        fn start(_config: &EngineConfig) -> Result<Self, EngineError> {
            Ok(Self {
                severities: Vec::new(),
                fail_with: None,
            })
        }

        fn analyze<T>(
            &self,
            config: &AnalysisConfiguration<T>,
            listener: &mut dyn IssueListener<T>,
            log: &dyn LogOutput,
        ) -> Result<AnalysisResults, EngineError> {
            log.log("starting", Level::Debug);
            for (i, severity) in self.severities.iter().enumerate() {
                listener.handle(&lintd::Issue {
                    start_line: i as i32,
                    start_line_offset: 0,
                    end_line: i as i32,
                    end_line_offset: 1,
                    message: format!("issue {}", i),
                    rule_key: "test:Rule".to_string(),
                    rule_name: "Test rule".to_string(),
                    severity: severity.to_string(),
                    input_file: config.files().first(),
                })?;
            }
            if let Some(msg) = self.fail_with {
                return Err(EngineError::Failure(msg.to_string()));
            }
            Ok(AnalysisResults {
                file_count: config.files().len(),
                failed_files: Vec::new(),
            })
        }

        fn rule_details(&self, _rule_key: &str) -> Option<RuleDetails> {
            None
        }

        fn rules(&self) -> Vec<String> {
            vec!["test:Rule".to_string()]
        }
    }

    fn scripted(severities: Vec<&'static str>, fail_with: Option<&'static str>) -> ScriptedEngine {
        ScriptedEngine {
            severities,
            fail_with,
        }
    }

    fn empty_config() -> AnalysisConfiguration<String> {
        AnalysisConfiguration::builder("/").build()
    }

    #[test]
    fn test_empty_configuration_completes_once() {
        let engine = BasicEngine::start(&EngineConfig::default()).unwrap();
        let sink = RecordingSink::<proto::Issue>::new();

        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        let state = session.run(&engine, &empty_config(), sink.clone());

        assert_eq!(state, SessionState::Completed);
        sink.with(|record| {
            assert_eq!(record.completed, 1);
            assert!(record.messages.is_empty());
            assert!(record.failed.is_empty());
        });
    }

    #[test]
    fn test_issues_stream_before_completion() {
        let engine = scripted(vec!["MAJOR", "INFO"], None);
        let sink = RecordingSink::<proto::Issue>::new();
        let config = AnalysisConfiguration::builder("/")
            .file(ClientInputFile::new("/a.txt", false, Charset::Utf8, "a".to_string()))
            .build();

        let state = Session::new().run(&engine, &config, sink.clone());

        assert_eq!(state, SessionState::Completed);
        sink.with(|record| {
            assert_eq!(record.messages.len(), 2);
            assert_eq!(record.messages[0].message, "issue 0");
            assert_eq!(record.messages[1].severity(), proto::issue::Severity::Info);
            assert_eq!(
                record.messages[0].input_file.as_ref().unwrap().user_object,
                "a"
            );
            assert_eq!(record.completed, 1);
        });
    }

    #[test]
    fn test_engine_failure_fails_stream() {
        let engine = scripted(vec!["MINOR"], Some("parser crashed"));
        let sink = RecordingSink::<proto::Issue>::new();

        let state = Session::new().run(&engine, &empty_config(), sink.clone());

        assert_eq!(state, SessionState::Failed);
        sink.with(|record| {
            assert_eq!(record.messages.len(), 1);
            assert_eq!(record.completed, 0);
            assert_eq!(record.failed.len(), 1);
            assert_eq!(record.failed[0].code(), Code::Internal);
            assert!(record.failed[0].message().contains("parser crashed"));
        });
    }

    #[test]
    fn test_invalid_severity_aborts_session() {
        let engine = scripted(vec!["MAJOR", "SEVERE", "MINOR"], None);
        let sink = RecordingSink::<proto::Issue>::new();

        let state = Session::new().run(&engine, &empty_config(), sink.clone());

        assert_eq!(state, SessionState::Failed);
        sink.with(|record| {
            assert_eq!(record.messages.len(), 1);
            assert_eq!(record.failed[0].code(), Code::Internal);
            assert!(record.failed[0].message().contains("SEVERE"));
        });
    }

    #[test]
    fn test_closed_issue_sink_aborts_session() {
        let engine = scripted(vec!["MAJOR", "MAJOR"], None);
        let sink = RecordingSink::<proto::Issue>::rejecting(SinkError::Closed);

        let state = Session::new().run(&engine, &empty_config(), sink.clone());

        assert_eq!(state, SessionState::Failed);
        sink.with(|record| {
            assert_eq!(record.completed, 0);
            assert_eq!(record.failed[0].code(), Code::Unavailable);
        });
    }

    #[test]
    fn test_log_sink_receives_engine_logs() {
        let engine = scripted(vec![], None);
        let issues = RecordingSink::<proto::Issue>::new();
        let logs = RecordingSink::<proto::LogEvent>::new();

        let state = Session::new()
            .with_log_sink(Arc::new(logs.clone()))
            .run(&engine, &empty_config(), issues.clone());

        assert_eq!(state, SessionState::Completed);
        logs.with(|record| {
            assert_eq!(record.messages.len(), 1);
            assert_eq!(record.messages[0].log, "starting");
            assert!(record.messages[0].is_debug);
        });
    }

    #[test]
    fn test_failing_log_sink_does_not_affect_session() {
        let engine = scripted(vec!["INFO"], None);
        let issues = RecordingSink::<proto::Issue>::new();
        let logs = RecordingSink::<proto::LogEvent>::rejecting(SinkError::Transport(
            "peer reset".to_string(),
        ));

        let state = Session::new()
            .with_log_sink(Arc::new(logs))
            .run(&engine, &empty_config(), issues.clone());

        assert_eq!(state, SessionState::Completed);
        issues.with(|record| {
            assert_eq!(record.messages.len(), 1);
            assert_eq!(record.completed, 1);
        });
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_config_error_is_invalid_argument() {
        let status = status_for(&EngineError::Config("bad".to_string()));
        assert_eq!(status.code(), Code::InvalidArgument);
    }
}
