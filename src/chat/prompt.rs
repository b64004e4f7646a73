use crate::language::Language;

/// Instruction sent to the chat API for one topic.
pub fn build_prompt(topic: &str, subject: &str, language: Language) -> String {
    let lang = language.display_name();
    format!(
        "You are a clear college-level teacher. Explain the topic \"{topic}\" from the subject {subject}.\n\
         Give:\n\
         1) A short definition.\n\
         2) Step-by-step explanation with numbered steps.\n\
         3) Key formulas using LaTeX (denote formulas with $...$).\n\
         4) One worked example (simple).\n\
         5) A short summary.\n\
         Use emojis where helpful. Format with headings, **bold** for important terms, *italic* for notes.\n\
         Write the whole answer in {lang}."
    )
}

/// Status line shown while a request is outstanding.
pub fn pending_message(topic: &str, language: Language) -> String {
    format!(
        "Requesting explanation for {topic} (language: {}) ...",
        language.display_name()
    )
}
