/// Reply the model is told to give when the document does not contain the answer.
pub const NOT_FOUND_REPLY: &str = "The answer is not found in the provided document text.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedPrompt {
    pub system: String,
    pub user: String,
}

/// Builds the two-message prompt that confines an answer to one document.
pub fn build_grounded_prompt(document_text: &str, question: &str) -> GroundedPrompt {
    let system = format!(
        "You are an expert assistant. Answer strictly from the document text provided. \
         If the answer isn't present, reply '{NOT_FOUND_REPLY}'\n\n\
         --- Document Context Start ---\n{document_text}\n--- Document Context End ---"
    );

    GroundedPrompt {
        system,
        user: question.to_string(),
    }
}
