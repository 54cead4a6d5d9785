//! gRPC service implementation for the StandaloneAnalyzer service.

use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use lintd::{
    AnalysisConfiguration, AnalysisEngine, BasicEngine, Charset, ClientInputFile, EngineConfig,
    RuleDetails, Sink,
};
use tokio::sync::{RwLock, Semaphore, mpsc};
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status};

use crate::proto::{self, AnalysisRequest, Empty, StandaloneConfiguration};
use crate::session::{Session, status_for};
use crate::sink::{ChannelSink, LossySink};

/// Default capacity of an issue response stream.
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// Default capacity of the log response stream.
pub const DEFAULT_LOG_BUFFER: usize = 256;

type IssueStream = Pin<Box<dyn Stream<Item = Result<proto::Issue, Status>> + Send>>;
type LogStream = Pin<Box<dyn Stream<Item = Result<proto::LogEvent, Status>> + Send>>;

/// The StandaloneAnalyzer gRPC service.
///
/// Holds one engine instance, created by `Start` and shared by every
/// `Analyze` call after it. The engine is not assumed to be safe for
/// concurrent use, so sessions queue on a single permit and run one at a
/// time.
pub struct AnalyzerService<E = BasicEngine> {
    engine: RwLock<Option<Arc<E>>>,
    permit: Arc<Semaphore>,
    log_sink: RwLock<Option<Arc<dyn Sink<proto::LogEvent>>>>,
    stream_buffer: usize,
    log_buffer: usize,
}

impl<E> fmt::Debug for AnalyzerService<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerService")
            .field("stream_buffer", &self.stream_buffer)
            .field("log_buffer", &self.log_buffer)
            .finish_non_exhaustive()
    }
}

impl<E: AnalysisEngine> Default for AnalyzerService<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: AnalysisEngine> AnalyzerService<E> {
    /// Create a service with default stream buffers and no engine started.
    pub fn new() -> Self {
        Self::with_buffers(DEFAULT_STREAM_BUFFER, DEFAULT_LOG_BUFFER)
    }

    /// Create a service with the given stream capacities.
    pub fn with_buffers(stream_buffer: usize, log_buffer: usize) -> Self {
        Self {
            engine: RwLock::new(None),
            permit: Arc::new(Semaphore::new(1)),
            log_sink: RwLock::new(None),
            stream_buffer: stream_buffer.max(1),
            log_buffer: log_buffer.max(1),
        }
    }

    async fn engine(&self) -> Result<Arc<E>, Status> {
        self.engine
            .read()
            .await
            .clone()
            .ok_or_else(|| Status::failed_precondition("engine not started; call Start first"))
    }
}

#[tonic::async_trait]
impl<E: AnalysisEngine> proto::standalone_analyzer_server::StandaloneAnalyzer
    for AnalyzerService<E>
{
    type AnalyzeStream = IssueStream;
    type StreamLogsStream = LogStream;

    async fn start(
        &self,
        request: Request<StandaloneConfiguration>,
    ) -> Result<Response<Empty>, Status> {
        let config = convert_engine_config(request.into_inner());

        let engine = tokio::task::spawn_blocking(move || E::start(&config))
            .await
            .map_err(|e| Status::internal(format!("engine start panicked: {}", e)))?
            .map_err(|e| status_for(&e))?;

        tracing::info!("Engine started with {} rule(s)", engine.rules().len());
        *self.engine.write().await = Some(Arc::new(engine));

        Ok(Response::new(Empty {}))
    }

    async fn analyze(
        &self,
        request: Request<AnalysisRequest>,
    ) -> Result<Response<Self::AnalyzeStream>, Status> {
        let engine = self.engine().await?;
        let config = convert_analysis_request(request.into_inner())?;
        let log_sink = self.log_sink.read().await.clone();

        let (tx, rx) = mpsc::channel::<Result<proto::Issue, Status>>(self.stream_buffer);
        // Kept by the driver task so a panicking session still ends the
        // stream with an error.
        let guard = tx.clone();
        let sink = ChannelSink::new(tx);
        let permit = Arc::clone(&self.permit);

        tokio::spawn(async move {
            let Ok(_permit) = permit.acquire_owned().await else {
                let _ = guard
                    .send(Err(Status::unavailable("analyzer is shutting down")))
                    .await;
                return;
            };

            let mut session = Session::new();
            if let Some(sink) = log_sink {
                session = session.with_log_sink(sink);
            }
            let id = session.id();
            tracing::debug!(
                session = id,
                files = config.files().len(),
                "Starting analysis session"
            );

            let result =
                tokio::task::spawn_blocking(move || session.run(engine.as_ref(), &config, sink))
                    .await;

            if let Err(e) = result {
                tracing::error!(session = id, "Analysis session panicked: {}", e);
                let _ = guard
                    .send(Err(Status::internal("analysis session ended unexpectedly")))
                    .await;
            }
        });

        Ok(Response::new(
            Box::pin(ReceiverStream::new(rx)) as Self::AnalyzeStream
        ))
    }

    async fn stream_logs(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::StreamLogsStream>, Status> {
        let (tx, rx) = mpsc::channel::<Result<proto::LogEvent, Status>>(self.log_buffer);
        let sink: Arc<dyn Sink<proto::LogEvent>> = Arc::new(LossySink::new(tx));

        if self.log_sink.write().await.replace(sink).is_some() {
            tracing::debug!("Replacing previously attached log stream");
        }

        Ok(Response::new(
            Box::pin(ReceiverStream::new(rx)) as Self::StreamLogsStream
        ))
    }

    async fn get_rule_details(
        &self,
        request: Request<proto::RuleKey>,
    ) -> Result<Response<proto::RuleDetails>, Status> {
        let key = request.into_inner().key;
        let engine = self.engine().await?;

        engine
            .rule_details(&key)
            .map(|details| Response::new(convert_rule_details(details)))
            .ok_or_else(|| Status::not_found(format!("unknown rule: {}", key)))
    }
}

fn convert_engine_config(config: StandaloneConfiguration) -> EngineConfig {
    EngineConfig {
        excluded_rules: config.excluded_rules.into_iter().collect(),
        properties: config.properties.into_iter().collect(),
    }
}

fn convert_analysis_request(req: AnalysisRequest) -> Result<AnalysisConfiguration<String>, Status> {
    let base_dir = if req.base_dir.is_empty() {
        std::env::current_dir()
            .map_err(|e| Status::internal(format!("cannot resolve working directory: {}", e)))?
    } else {
        PathBuf::from(&req.base_dir)
    };

    let mut builder = AnalysisConfiguration::builder(&base_dir);
    if !req.work_dir.is_empty() {
        builder = builder.work_dir(&req.work_dir);
    }
    for (key, value) in req.properties {
        builder = builder.property(key, value);
    }

    for (index, file) in req.files.into_iter().enumerate() {
        if file.path.is_empty() {
            return Err(Status::invalid_argument(format!(
                "file #{} has an empty path",
                index
            )));
        }
        let charset = Charset::from_label(&file.charset)
            .map_err(|e| Status::invalid_argument(format!("{}: {}", file.path, e)))?;
        builder = builder.file(ClientInputFile::resolve(
            &base_dir,
            &file.path,
            file.is_test,
            charset,
            file.user_object,
        ));
    }

    Ok(builder.build())
}

fn convert_rule_details(details: RuleDetails) -> proto::RuleDetails {
    proto::RuleDetails {
        key: details.key,
        name: details.name,
        html_description: details.html_description,
        language: details.language,
        severity: details.severity,
    }
}
