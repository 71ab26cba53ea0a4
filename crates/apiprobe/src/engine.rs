//! Engine factory
//!
//! An [`Engine`] holds the configuration, the HTTP transport and the report
//! sink shared read-only by every test created from it.

use apiprobe_core::EngineConfig;
use std::fmt;
use std::sync::Arc;

use crate::builder::TestBuilder;
use crate::error::Result;
use crate::host::HostRunner;
use crate::orchestrator::RetryOrchestrator;
use crate::outcome::TestOutcome;
use crate::plan::TestPlan;
use crate::report::{ReportSink, TracingReportSink};
use crate::request::RequestDefaults;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Creates tests that share one configuration, transport and report sink
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    defaults: RequestDefaults,
    transport: Arc<dyn HttpTransport>,
    sink: Arc<dyn ReportSink>,
}

impl Engine {
    /// Engine with the reqwest transport and tracing report steps
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Start defining a test
    pub fn test(&self, name: impl Into<String>) -> TestBuilder {
        TestBuilder::new(self.clone(), name)
    }

    pub(crate) async fn run(&self, plan: &TestPlan, host: &dyn HostRunner) -> TestOutcome {
        let inner = &*self.inner;
        RetryOrchestrator::new(
            inner.transport.as_ref(),
            inner.sink.as_ref(),
            &inner.defaults,
            &inner.config.report,
        )
        .run(plan, host)
        .await
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`Engine`] with custom collaborators
pub struct EngineBuilder {
    config: EngineConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    sink: Option<Arc<dyn ReportSink>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            transport: None,
            sink: None,
        }
    }

    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn report_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingReportSink) as Arc<dyn ReportSink>);

        tracing::debug!(
            timeout_ms = self.config.request.timeout_ms,
            request_attempts = self.config.request.retry.max_attempts,
            attempts = self.config.attempt.retry.max_attempts,
            "engine created"
        );

        Ok(Engine {
            inner: Arc::new(EngineInner {
                defaults: RequestDefaults {
                    user_agent: self.config.request.user_agent.clone(),
                },
                config: self.config,
                transport,
                sink,
            }),
        })
    }
}
