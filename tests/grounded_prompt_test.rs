use askdocx::application::services::{NOT_FOUND_REPLY, build_grounded_prompt};

#[test]
fn given_document_and_question_when_building_prompt_then_system_message_embeds_document() {
    let prompt = build_grounded_prompt("Revenue grew 12%.", "How much did revenue grow?");

    assert!(prompt.system.contains("Revenue grew 12%."));
    assert!(prompt.system.contains(NOT_FOUND_REPLY));
    assert!(prompt.system.contains("Answer strictly from the document text"));
    assert_eq!(prompt.user, "How much did revenue grow?");
}

#[test]
fn given_document_when_building_prompt_then_document_is_fenced() {
    let prompt = build_grounded_prompt("body", "q");

    let start = prompt.system.find("--- Document Context Start ---").unwrap();
    let body = prompt.system.find("body").unwrap();
    let end = prompt.system.find("--- Document Context End ---").unwrap();
    assert!(start < body && body < end);
}
