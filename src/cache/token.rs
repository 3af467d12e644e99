use crate::helpers::time::now_i64;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: i64, // UNIX TIMESTAMP
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: i64) -> Self {
        Self { value: value.into(), expires_at }
    }

    /// A token is usable up to and including its `expires_at` second.
    pub fn is_expired(&self) -> bool {
        now_i64() > self.expires_at
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
