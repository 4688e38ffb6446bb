use crate::{CollabError, CollabResult, QuestionContent};

pub const MIN_OPTIONS: usize = 2;

/// Checks that a question is playable and normalizes blank optional fields
pub fn validate_question(mut content: QuestionContent) -> CollabResult<QuestionContent> {
    content.question = content.question.trim().to_string();

    if content.question.is_empty() {
        return Err(CollabError::validation("Question text is required"));
    }

    if content.options.len() < MIN_OPTIONS {
        return Err(CollabError::validation(format!(
            "A question needs at least {} options",
            MIN_OPTIONS
        )));
    }

    if content.options.iter().any(|o| o.trim().is_empty()) {
        return Err(CollabError::validation("Options can't be empty"));
    }

    if !content.options.contains(&content.answer) {
        return Err(CollabError::validation(
            "The answer must be one of the options",
        ));
    }

    content.category = non_blank(content.category);
    content.difficulty = non_blank(content.difficulty);
    content.image = non_blank(content.image);

    Ok(content)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(options: &[&str], answer: &str) -> QuestionContent {
        QuestionContent {
            question: " What is 2 + 2? ".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.to_string(),
            category: Some("  ".to_string()),
            difficulty: Some("easy".to_string()),
            image: None,
        }
    }

    #[test]
    fn test_valid_question_is_normalized() {
        let content = validate_question(content(&["3", "4"], "4")).expect("is valid");

        assert_eq!(content.question, "What is 2 + 2?");
        assert_eq!(content.category, None, "blank category is dropped");
        assert_eq!(content.difficulty.as_deref(), Some("easy"));
    }

    #[test]
    fn test_answer_must_be_an_option() {
        assert!(matches!(
            validate_question(content(&["3", "5"], "4")),
            Err(CollabError::Validation(_))
        ));
    }

    #[test]
    fn test_needs_two_options() {
        assert!(matches!(
            validate_question(content(&["4"], "4")),
            Err(CollabError::Validation(_))
        ));
    }
}
