use serde::Serialize;
use serde_json::{Map, Value};

use super::taxonomy::Taxonomy;

/// A user profile as returned by the backend. Shape is not validated.
pub type UserRecord = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub current_user: UserRecord,
    pub taxonomy: &'static Taxonomy,
    pub session_counter: i64,
}

/// State transitions accepted by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetUser(UserRecord),
    SetLoginState(bool),
    SetCounter(i64),
}

/// Storage work a transition requires. Applied in order by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PersistUser(String),
    RemoveToken,
    RemoveUser,
}

impl SessionState {
    pub fn logged_out() -> Self {
        Self {
            is_logged_in: false,
            current_user: UserRecord::new(),
            taxonomy: Taxonomy::standard(),
            session_counter: 0,
        }
    }

    /// Rebuild state from the raw token and user values found in storage.
    ///
    /// An empty token counts as absent. A user value that is missing, not
    /// JSON, or not a JSON object yields an empty record. Without a token the
    /// stored user is ignored so that a logged-out state never carries one.
    pub fn restore(token: Option<&str>, user: Option<&str>) -> Self {
        let mut state = Self::logged_out();
        state.is_logged_in = token.is_some_and(|t| !t.is_empty());

        if state.is_logged_in {
            state.current_user = user.map(parse_user).unwrap_or_default();
        }

        state
    }

    pub fn apply(&mut self, mutation: Mutation) -> Vec<Effect> {
        match mutation {
            Mutation::SetUser(user) => {
                let serialized = Value::Object(user.clone()).to_string();
                self.current_user = user;
                vec![Effect::PersistUser(serialized)]
            }
            Mutation::SetLoginState(true) => {
                self.is_logged_in = true;
                Vec::new()
            }
            Mutation::SetLoginState(false) => {
                self.is_logged_in = false;
                self.current_user = UserRecord::new();
                vec![Effect::RemoveToken, Effect::RemoveUser]
            }
            Mutation::SetCounter(value) => {
                self.session_counter = value;
                Vec::new()
            }
        }
    }
}

fn parse_user(raw: &str) -> UserRecord {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!("Stored user record is not an object ({}), using empty user", kind(&other));
            UserRecord::new()
        }
        Err(e) => {
            tracing::warn!("Stored user record is malformed, using empty user: {}", e);
            UserRecord::new()
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(value: Value) -> UserRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn restore_token_without_user() {
        let state = SessionState::restore(Some("abc"), None);
        assert!(state.is_logged_in);
        assert!(state.current_user.is_empty());
    }

    #[test]
    fn restore_malformed_user() {
        let state = SessionState::restore(Some("abc"), Some("{\"name\": "));
        assert!(state.is_logged_in);
        assert!(state.current_user.is_empty());

        let state = SessionState::restore(Some("abc"), Some("[1, 2]"));
        assert!(state.current_user.is_empty());
    }

    #[test]
    fn restore_ignores_user_without_token() {
        let state = SessionState::restore(None, Some(r#"{"username":"neo"}"#));
        assert!(!state.is_logged_in);
        assert!(state.current_user.is_empty());

        let state = SessionState::restore(Some(""), Some(r#"{"username":"neo"}"#));
        assert!(!state.is_logged_in);
    }

    #[test]
    fn set_user_keeps_login_flag() {
        let mut state = SessionState::logged_out();
        let effects = state.apply(Mutation::SetUser(user(json!({"username": "neo", "role": "admin"}))));

        assert!(!state.is_logged_in);
        assert_eq!(state.current_user["username"], "neo");
        match effects.as_slice() {
            [Effect::PersistUser(raw)] => {
                let parsed: Value = serde_json::from_str(raw).unwrap();
                assert_eq!(parsed, json!({"username": "neo", "role": "admin"}));
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn logout_clears_user_and_requests_removal() {
        let mut state = SessionState::restore(Some("abc"), Some(r#"{"username":"neo"}"#));
        let effects = state.apply(Mutation::SetLoginState(false));

        assert!(!state.is_logged_in);
        assert!(state.current_user.is_empty());
        assert_eq!(effects, vec![Effect::RemoveToken, Effect::RemoveUser]);
    }

    #[test]
    fn login_has_no_effects() {
        let mut state = SessionState::logged_out();
        state.apply(Mutation::SetUser(user(json!({"username": "neo"}))));
        let effects = state.apply(Mutation::SetLoginState(true));

        assert!(effects.is_empty());
        assert!(state.is_logged_in);
        assert_eq!(state.current_user["username"], "neo");
    }

    #[test]
    fn counter_is_plain_setter() {
        let mut state = SessionState::logged_out();
        assert!(state.apply(Mutation::SetCounter(42)).is_empty());
        assert_eq!(state.session_counter, 42);
    }
}
