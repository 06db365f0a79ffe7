use crate::llm::types::{ChatMessage, ContentPart, MessageContent, Role};

/// Append-only model conversation.
///
/// The first turn is always the system policy. Images are dropped from a user
/// turn once the model has answered it, so only the newest user turn can carry
/// a screenshot and the payload stays bounded however long the task runs.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatMessage::system(system_prompt)],
        }
    }

    /// Appends a user turn and returns its index.
    pub fn push_user(&mut self, text: impl Into<String>, image_url: Option<String>) -> usize {
        self.turns.push(ChatMessage::user_with_image(text, image_url));
        self.turns.len() - 1
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) -> usize {
        self.turns.push(ChatMessage::assistant(text));
        self.turns.len() - 1
    }

    /// Removes image parts from one turn, keeping its text. Returns whether
    /// anything was removed.
    pub fn strip_image(&mut self, index: usize) -> bool {
        let Some(turn) = self.turns.get_mut(index) else {
            return false;
        };
        let MessageContent::Parts(parts) = &mut turn.content else {
            return false;
        };
        let before = parts.len();
        parts.retain(|p| !matches!(p, ContentPart::ImageUrl { .. }));
        before != parts.len()
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.turns.iter().filter(|t| t.has_image()).count()
    }

    /// Index of the turn still holding a screenshot, if any.
    pub fn image_turn(&self) -> Option<usize> {
        self.turns.iter().rposition(ChatMessage::has_image)
    }

    pub fn last_user_index(&self) -> Option<usize> {
        self.turns.iter().rposition(|t| t.role == Role::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG: &str = "data:image/png;base64,AAAA";

    #[test]
    fn starts_with_system_turn() {
        let conv = Conversation::new("rules");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.turns()[0].role, Role::System);
        assert_eq!(conv.image_count(), 0);
    }

    #[test]
    fn strip_keeps_text() {
        let mut conv = Conversation::new("rules");
        let idx = conv.push_user("screen info", Some(IMG.into()));
        assert_eq!(conv.image_turn(), Some(idx));

        assert!(conv.strip_image(idx));
        assert_eq!(conv.image_count(), 0);
        assert_eq!(conv.turns()[idx].text(), "screen info");
        // Second strip is a no-op.
        assert!(!conv.strip_image(idx));
    }

    #[test]
    fn strip_ignores_text_turns_and_bad_indexes() {
        let mut conv = Conversation::new("rules");
        assert!(!conv.strip_image(0));
        assert!(!conv.strip_image(42));
    }

    #[test]
    fn single_image_under_discipline() {
        let mut conv = Conversation::new("rules");
        for step in 0..5 {
            let idx = conv.push_user(format!("step {step}"), Some(IMG.into()));
            assert_eq!(conv.image_count(), 1);
            assert_eq!(conv.image_turn(), conv.last_user_index());
            conv.strip_image(idx);
            conv.push_assistant("<think></think><answer>do(action=\"Back\")</answer>");
        }
        assert_eq!(conv.image_count(), 0);
        assert_eq!(conv.len(), 11);
    }
}
