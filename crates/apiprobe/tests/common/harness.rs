//! Engine harness for integration tests

use apiprobe::{Engine, EngineConfig, MemoryReportSink, RecordingHost, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// An engine plus handles on everything it reports to
pub struct Harness {
    pub engine: Engine,
    pub sink: Arc<MemoryReportSink>,
    pub host: RecordingHost,
}

/// Single attempts, single requests and a short timeout
pub fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.request.timeout_ms = 2_000;
    config.request.retry = RetryPolicy::once();
    config.attempt.retry = RetryPolicy::once();
    config
}

pub fn harness() -> Harness {
    harness_with(fast_config())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let sink = Arc::new(MemoryReportSink::new());
    let engine = Engine::builder(config)
        .report_sink(Arc::clone(&sink))
        .build()
        .expect("engine");
    Harness {
        engine,
        sink,
        host: RecordingHost::new(),
    }
}

/// Fixed-delay policy with a short delay
pub fn retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::fixed(max_attempts, Duration::from_millis(10)).expect("policy")
}
