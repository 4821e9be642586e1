// src/exam/prompts.rs
// Pure prompt builders. Kept free of I/O so the exact text each operation
// sends upstream can be asserted in tests.

use super::difficulty::DifficultyProfile;

/// System prompt for `start`: exactly one open-ended question, sized for a
/// short spoken answer, no commentary around it.
pub fn start_system(topic: &str, profile: &DifficultyProfile) -> String {
    format!(
        "You are an oral-exam examiner for an English learner at level {level}. \
         Ask exactly one open-ended question about the topic \"{topic}\" that can be \
         answered in 20-40 seconds of speech. {style} \
         Output only the question itself, with no introduction or commentary.",
        level = profile.level_description,
        topic = topic,
        style = profile.style_hint,
    )
}

pub fn start_user(topic: &str) -> String {
    format!("Topic: {topic}")
}

/// System prompt for `turn`: demands a JSON object with the five TurnResult keys.
pub fn turn_system(profile: &DifficultyProfile) -> String {
    format!(
        "You are a concise, supportive language tutor for oral exams. \
         The student is at level {level}. {style} \
         Evaluate the student's spoken answer and reply with a JSON object \
         containing exactly these keys: \
         \"feedback\" (key mistakes in grammar, word choice, and fluency), \
         \"corrected_answer\" (one good version of the answer), \
         \"tip\" (one tip to improve), \
         \"score\" (integer 1-10), \
         \"next_question\" (one follow-up question on the same topic). \
         Output only the JSON object.",
        level = profile.level_description,
        style = profile.style_hint,
    )
}

pub fn turn_user(topic: &str, last_question: &str, transcript: &str) -> String {
    format!(
        "Topic: {topic}\nQuestion: {last_question}\nStudent answer: {transcript}"
    )
}

/// System prompt for the plain `/api/feedback` endpoint (numbered-list text,
/// not structured output).
pub fn feedback_system() -> &'static str {
    "You are a concise, supportive language tutor for oral exams."
}

pub fn feedback_user(transcript: &str, prompt: &str) -> String {
    format!(
        "Question (optional): {prompt}\n\
         Student answer: {transcript}\n\n\
         Return:\n\
         1) Key mistakes (grammar/word choice/fluency)\n\
         2) Corrected answer (one good version)\n\
         3) One tip to improve"
    )
}

/// Default system prompt for the free-form answer endpoints.
pub fn answer_system_default() -> &'static str {
    "You are an oral-exam interlocutor. Keep answers concise and ask one follow-up question."
}

/// System prompt for the dictionary endpoint: JSON object with the five
/// dictionary keys, examples pitched at the learner's level.
pub fn dictionary_system(profile: &DifficultyProfile) -> String {
    format!(
        "You are a learner's dictionary for English students at level {level}. \
         For the given term, reply with a JSON object containing exactly these keys: \
         \"headword\", \"part_of_speech\", \"meaning\" (one plain-English definition), \
         \"examples\" (list of example sentences), \"synonyms\" (list of words). \
         {style} Output only the JSON object.",
        level = profile.level_description,
        style = profile.style_hint,
    )
}

pub fn dictionary_user(term: &str) -> String {
    format!("Term: {term}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::difficulty::resolve;

    #[test]
    fn start_prompt_embeds_level_and_topic() {
        let prompt = start_system("school life", &resolve("beginner"));
        assert!(prompt.contains("A2 (beginner)"));
        assert!(prompt.contains("school life"));
        assert!(prompt.contains("20-40 seconds"));
    }

    #[test]
    fn turn_prompt_demands_all_five_keys() {
        let prompt = turn_system(&resolve("expert"));
        for key in ["feedback", "corrected_answer", "tip", "score", "next_question"] {
            assert!(prompt.contains(key), "turn prompt missing key {key}");
        }
        assert!(prompt.contains("B2\u{2013}C1 (advanced)"));
    }

    #[test]
    fn turn_user_embeds_all_context() {
        let prompt = turn_user("school life", "What do you enjoy?", "I go to school");
        assert!(prompt.contains("school life"));
        assert!(prompt.contains("What do you enjoy?"));
        assert!(prompt.contains("I go to school"));
    }

    #[test]
    fn dictionary_prompt_lists_key_set() {
        let prompt = dictionary_system(&resolve("moderate"));
        for key in ["headword", "part_of_speech", "meaning", "examples", "synonyms"] {
            assert!(prompt.contains(key));
        }
    }
}
