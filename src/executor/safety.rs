// Sensitive-action policy.
use crate::agent_engine::state::Action;

/// Warning the model attached to a tap on a payment/privacy/property button.
pub fn sensitive_notice(action: &Action) -> Option<&str> {
    match action {
        Action::Tap {
            warn_message: Some(msg),
            ..
        } => Some(msg.as_str()),
        _ => None,
    }
}

/// True if this action must be handed to the user instead of dispatched.
pub fn requires_takeover(action: &Action, takeover_on_sensitive_tap: bool) -> bool {
    takeover_on_sensitive_tap && sensitive_notice(action).is_some()
}
