//! Forwards engine issues onto the outbound issue stream.

use lintd::{Issue, IssueError, IssueListener, Severity, Sink};

use crate::proto;

/// Issue listener that turns each engine issue into one wire message.
///
/// Nothing is buffered: every `handle` call sends exactly one message
/// before returning. Conversion and sink failures are returned to the
/// engine, which aborts the analysis.
#[derive(Debug)]
pub struct IssueProxy<'a, S> {
    sink: &'a S,
}

impl<'a, S: Sink<proto::Issue>> IssueProxy<'a, S> {
    /// Create a proxy bound to `sink`.
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }
}

impl<S: Sink<proto::Issue>> IssueListener<String> for IssueProxy<'_, S> {
    fn handle(&mut self, issue: &Issue<'_, String>) -> Result<(), IssueError> {
        let message = to_wire(issue)?;
        self.sink.send(message)?;
        Ok(())
    }
}

/// Convert an engine issue to its wire form.
///
/// The span is copied as-is. The severity label must be one of the
/// [`Severity`] labels.
pub fn to_wire(issue: &Issue<'_, String>) -> Result<proto::Issue, IssueError> {
    let severity: Severity = issue.severity.parse()?;
    Ok(proto::Issue {
        severity: proto::issue::Severity::from(severity).into(),
        start_line: issue.start_line,
        start_line_offset: issue.start_line_offset,
        end_line: issue.end_line,
        end_line_offset: issue.end_line_offset,
        message: issue.message.clone(),
        rule_key: issue.rule_key.clone(),
        rule_name: issue.rule_name.clone(),
        input_file: issue.input_file.map(|file| proto::InputFile {
            path: file.path(),
            charset: file.charset().name().to_string(),
            is_test: file.is_test(),
            user_object: file.client_object().clone(),
        }),
    })
}

impl From<Severity> for proto::issue::Severity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => proto::issue::Severity::Info,
            Severity::Minor => proto::issue::Severity::Minor,
            Severity::Major => proto::issue::Severity::Major,
            Severity::Critical => proto::issue::Severity::Critical,
            Severity::Blocker => proto::issue::Severity::Blocker,
        }
    }
}
