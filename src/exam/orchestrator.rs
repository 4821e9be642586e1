// src/exam/orchestrator.rs
// Drives the start -> turn -> feedback -> next-question progression.
// Stateless across calls: the client resends topic/difficulty/last_question
// each turn. Each operation is strictly sequential: resolve profile, call
// the gateway, parse, persist, respond.

use std::sync::Arc;
use tracing::warn;

use super::difficulty::Difficulty;
use super::parser::{self, DictionaryEntry, TurnResult};
use super::prompts;
use crate::audit::AuditLog;
use crate::error::ApiError;
use crate::llm::{CompletionApi, CompletionOptions};
use crate::store::{LogStore, ScoreSet};

/// Output of `start`: the opening question plus which model produced it.
#[derive(Debug, Clone)]
pub struct StartedExam {
    pub question: String,
    pub model: String,
}

/// Output of `turn`.
#[derive(Debug, Clone)]
pub struct CompletedTurn {
    pub result: TurnResult,
    pub model: String,
}

pub struct ExamOrchestrator {
    gateway: Arc<dyn CompletionApi>,
    logs: Arc<dyn LogStore>,
    audit: Arc<AuditLog>,
}

impl ExamOrchestrator {
    pub fn new(
        gateway: Arc<dyn CompletionApi>,
        logs: Arc<dyn LogStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            gateway,
            logs,
            audit,
        }
    }

    /// Open an exam: one open-ended question for the topic at the requested
    /// difficulty. The question is the trimmed gateway output verbatim.
    pub async fn start(&self, topic: &str, difficulty: &str) -> Result<StartedExam, ApiError> {
        let profile = Difficulty::from_label(difficulty).profile();
        let system = prompts::start_system(topic, &profile);
        let user = prompts::start_user(topic);

        let raw = self
            .gateway
            .complete(
                &system,
                &user,
                CompletionOptions {
                    temperature: 0.4,
                    max_tokens: 150,
                    structured_output: false,
                },
            )
            .await?;

        Ok(StartedExam {
            question: raw.trim().to_string(),
            model: self.gateway.model_id().to_string(),
        })
    }

    /// Evaluate one spoken answer and produce feedback plus the next
    /// question. Exactly one log-store write per successful turn; none on
    /// gateway failure. The write is best-effort: a store failure is logged
    /// and never masks the already-computed result.
    pub async fn turn(
        &self,
        transcript: &str,
        last_question: &str,
        topic: &str,
        difficulty: &str,
    ) -> Result<CompletedTurn, ApiError> {
        let transcript = transcript.trim();
        let last_question = last_question.trim();
        if transcript.is_empty() {
            return Err(ApiError::Validation("transcript is required".into()));
        }
        if last_question.is_empty() {
            return Err(ApiError::Validation("last_question is required".into()));
        }

        let profile = Difficulty::from_label(difficulty).profile();
        let system = prompts::turn_system(&profile);
        let user = prompts::turn_user(topic, last_question, transcript);

        let raw = self
            .gateway
            .complete(
                &system,
                &user,
                CompletionOptions {
                    temperature: 0.3,
                    max_tokens: 400,
                    structured_output: true,
                },
            )
            .await?;

        // Total: a malformed reply degrades to a usable fallback result.
        let result = parser::parse_turn(&raw);
        let model = self.gateway.model_id().to_string();

        self.persist_turn(transcript, &result.feedback, &model).await;

        Ok(CompletedTurn { result, model })
    }

    async fn persist_turn(&self, transcript: &str, feedback: &str, model: &str) {
        match self
            .logs
            .create(transcript, feedback, model, ScoreSet::default())
            .await
        {
            Ok(row) => {
                self.audit
                    .record(
                        "AI_FEEDBACK_CREATED",
                        &[
                            ("id", row.id.to_string()),
                            ("model", model.to_string()),
                            ("input_chars", transcript.len().to_string()),
                        ],
                    )
                    .await;
            }
            Err(e) => {
                // Persistence is secondary to response correctness.
                warn!("log store write failed after turn: {e:#}");
            }
        }
    }

    /// Plain-text feedback endpoint (no structured output). Persists one
    /// log row like `turn` does.
    pub async fn feedback(&self, transcript: &str, prompt: &str) -> Result<CompletedTurn, ApiError> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(ApiError::Validation("transcript is required".into()));
        }

        let raw = self
            .gateway
            .complete(
                prompts::feedback_system(),
                &prompts::feedback_user(transcript, prompt.trim()),
                CompletionOptions {
                    temperature: 0.2,
                    max_tokens: 250,
                    structured_output: false,
                },
            )
            .await?;

        let feedback = raw.trim().to_string();
        let model = self.gateway.model_id().to_string();
        self.persist_turn(transcript, &feedback, &model).await;

        Ok(CompletedTurn {
            result: TurnResult {
                feedback,
                corrected_answer: String::new(),
                tip: String::new(),
                score: None,
                next_question: String::new(),
            },
            model,
        })
    }

    /// Free-form answer (the non-streaming fallback for the relay). No
    /// persistence.
    pub async fn answer(&self, query: &str, system: Option<&str>) -> Result<String, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::Validation("q is required".into()));
        }
        let system = match system.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => prompts::answer_system_default(),
        };

        self.gateway
            .complete(
                system,
                query,
                CompletionOptions {
                    temperature: 0.4,
                    max_tokens: 512,
                    structured_output: false,
                },
            )
            .await
    }

    /// Dictionary lookup with the decode-or-fallback contract. No
    /// persistence.
    pub async fn define(&self, term: &str, difficulty: &str) -> Result<DictionaryEntry, ApiError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ApiError::Validation("term is required".into()));
        }

        let profile = Difficulty::from_label(difficulty).profile();
        let raw = self
            .gateway
            .complete(
                &prompts::dictionary_system(&profile),
                &prompts::dictionary_user(term),
                CompletionOptions {
                    temperature: 0.3,
                    max_tokens: 400,
                    structured_output: true,
                },
            )
            .await?;

        Ok(parser::parse_dictionary(&raw, term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionStream, StreamEvent};
    use crate::store::{AnalysisLog, LogPage, LogPatch};
    use anyhow::Result as AnyResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Gateway double: returns a canned reply and records every call.
    struct ScriptedGateway {
        reply: String,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGateway {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last_system_prompt(&self) -> String {
            self.calls.lock().unwrap().last().unwrap().0.clone()
        }
    }

    #[async_trait]
    impl CompletionApi for ScriptedGateway {
        fn model_id(&self) -> &str {
            "test-model"
        }

        async fn complete(
            &self,
            system_prompt: &str,
            user_prompt: &str,
            _options: CompletionOptions,
        ) -> Result<String, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            Ok(self.reply.clone())
        }

        async fn complete_stream(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: CompletionOptions,
        ) -> Result<CompletionStream, ApiError> {
            Ok(Box::pin(futures::stream::iter(vec![StreamEvent::Done])))
        }
    }

    /// Store double counting creates.
    #[derive(Default)]
    struct RecordingStore {
        creates: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl LogStore for RecordingStore {
        async fn create(
            &self,
            input_text: &str,
            feedback_text: &str,
            model_name: &str,
            _scores: ScoreSet,
        ) -> AnyResult<AnalysisLog> {
            self.creates.lock().unwrap().push((
                input_text.to_string(),
                feedback_text.to_string(),
                model_name.to_string(),
            ));
            Ok(AnalysisLog {
                id: 1,
                input_text: input_text.to_string(),
                feedback_text: feedback_text.to_string(),
                model_name: model_name.to_string(),
                score_overall: None,
                score_grammar: None,
                score_fluency: None,
                score_pronunciation: None,
                created_at: None,
            })
        }

        async fn get(&self, _id: i64) -> AnyResult<Option<AnalysisLog>> {
            Ok(None)
        }

        async fn update(&self, _id: i64, _patch: LogPatch) -> AnyResult<Option<AnalysisLog>> {
            Ok(None)
        }

        async fn delete(&self, _id: i64) -> AnyResult<bool> {
            Ok(false)
        }

        async fn list(&self, page: u32, per_page: u32) -> AnyResult<LogPage> {
            Ok(LogPage {
                page,
                per_page,
                total: 0,
                items: vec![],
            })
        }

        async fn count(&self) -> AnyResult<i64> {
            Ok(0)
        }
    }

    fn orchestrator(
        gateway: Arc<ScriptedGateway>,
        store: Arc<RecordingStore>,
    ) -> (ExamOrchestrator, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(AuditLog::new(dir.path().join("audit.txt")));
        (ExamOrchestrator::new(gateway, store, audit), dir)
    }

    #[tokio::test]
    async fn start_embeds_level_and_topic_and_trims_output() {
        let gateway = ScriptedGateway::new("  What do you like about school?  \n");
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store);

        let started = orch.start("school life", "beginner").await.unwrap();
        assert_eq!(started.question, "What do you like about school?");
        assert_eq!(started.model, "test-model");

        let system = gateway.last_system_prompt();
        assert!(system.contains("A2 (beginner)"));
        assert!(system.contains("school life"));
    }

    #[tokio::test]
    async fn turn_with_empty_transcript_makes_no_external_calls() {
        let gateway = ScriptedGateway::new("{}");
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store.clone());

        let err = orch
            .turn("   ", "What do you enjoy?", "school life", "moderate")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(gateway.call_count(), 0);
        assert!(store.creates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn turn_with_empty_last_question_is_rejected() {
        let gateway = ScriptedGateway::new("{}");
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store.clone());

        let err = orch
            .turn("I go to school", "", "school life", "moderate")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn successful_turn_parses_exactly_and_writes_one_log_row() {
        let reply = serde_json::json!({
            "feedback": "Good use of present tense",
            "corrected_answer": "I go to school every day.",
            "tip": "Vary sentence length.",
            "score": 7,
            "next_question": "What subject do you like most?"
        })
        .to_string();
        let gateway = ScriptedGateway::new(&reply);
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store.clone());

        let turn = orch
            .turn(
                "I go to school every day",
                "What do you enjoy?",
                "school life",
                "expert",
            )
            .await
            .unwrap();

        assert_eq!(turn.result.feedback, "Good use of present tense");
        assert_eq!(turn.result.corrected_answer, "I go to school every day.");
        assert_eq!(turn.result.tip, "Vary sentence length.");
        assert_eq!(turn.result.score, Some(7));
        assert_eq!(turn.result.next_question, "What subject do you like most?");
        assert_eq!(turn.model, "test-model");

        let creates = store.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        let (input, feedback, model) = &creates[0];
        assert_eq!(input, "I go to school every day");
        assert_eq!(feedback, "Good use of present tense");
        assert_eq!(model, "test-model");
    }

    #[tokio::test]
    async fn malformed_reply_degrades_but_still_persists() {
        let gateway = ScriptedGateway::new("Sorry, I cannot process this.");
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store.clone());

        let turn = orch
            .turn("I go to school", "What do you enjoy?", "school life", "moderate")
            .await
            .unwrap();

        assert_eq!(turn.result.feedback, "Sorry, I cannot process this.");
        assert_eq!(turn.result.corrected_answer, "");
        assert_eq!(turn.result.tip, "");
        assert_eq!(turn.result.score, None);
        assert_eq!(
            turn.result.next_question,
            crate::exam::parser::FALLBACK_NEXT_QUESTION
        );

        let creates = store.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].1, "Sorry, I cannot process this.");
    }

    #[tokio::test]
    async fn answer_uses_default_system_prompt_when_blank() {
        let gateway = ScriptedGateway::new("An answer.");
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store);

        orch.answer("How are you?", Some("  ")).await.unwrap();
        assert_eq!(
            gateway.last_system_prompt(),
            prompts::answer_system_default()
        );
    }

    #[tokio::test]
    async fn define_rejects_blank_term() {
        let gateway = ScriptedGateway::new("{}");
        let store = Arc::new(RecordingStore::default());
        let (orch, _dir) = orchestrator(gateway.clone(), store);

        let err = orch.define("  ", "moderate").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(gateway.call_count(), 0);
    }
}
