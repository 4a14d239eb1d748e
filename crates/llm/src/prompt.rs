//! Prompt construction helpers.
//!
//! `Llm::complete`/`stream` take a single flattened prompt string; the
//! system/user split and section assembly live here so callers (the
//! synthesizer, self-critic, and intent-classification fallback in
//! `gweta-agent`/`gweta-retrieval`) build prompts declaratively instead of
//! hand-formatting strings at the call site.

/// A system instruction plus a user turn, flattened into the single prompt
/// string the `Llm` trait expects.
pub struct PromptBuilder {
    system: String,
    sections: Vec<(String, String)>,
}

impl PromptBuilder {
    pub fn new(system: impl Into<String>) -> Self {
        Self { system: system.into(), sections: Vec::new() }
    }

    /// Append a labelled section (e.g. "CONTEXT", "QUESTION", "PRIOR ANSWER").
    pub fn section(mut self, label: &str, body: impl Into<String>) -> Self {
        self.sections.push((label.to_string(), body.into()));
        self
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        out.push_str(&self.system);
        for (label, body) in &self.sections {
            out.push_str("\n\n### ");
            out.push_str(label);
            out.push('\n');
            out.push_str(body);
        }
        out
    }
}
