// src/web/state.rs
// Shared application state: Arc'd collaborators, read-only after startup.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::exam::ExamOrchestrator;
use crate::llm::CompletionApi;
use crate::speech::SpeechClient;
use crate::store::LogStore;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ExamOrchestrator>,
    pub gateway: Arc<dyn CompletionApi>,
    pub logs: Arc<dyn LogStore>,
    pub audit: Arc<AuditLog>,
    /// None when no direct API key is configured.
    pub speech: Option<Arc<SpeechClient>>,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn CompletionApi>,
        logs: Arc<dyn LogStore>,
        audit: Arc<AuditLog>,
        speech: Option<Arc<SpeechClient>>,
    ) -> Self {
        let orchestrator = Arc::new(ExamOrchestrator::new(
            gateway.clone(),
            logs.clone(),
            audit.clone(),
        ));
        Self {
            orchestrator,
            gateway,
            logs,
            audit,
            speech,
        }
    }
}
