// src/exam/mod.rs
// Exam-turn core: difficulty profiles, prompt builders, the total
// decode-or-fallback parsers, and the orchestrator tying them to the
// completion gateway and the log store.

pub mod difficulty;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

pub use difficulty::{Difficulty, DifficultyProfile};
pub use orchestrator::ExamOrchestrator;
pub use parser::{DictionaryEntry, TurnResult};
