/// Canned replies used when the config does not provide any.
pub const DEFAULT_REPLIES: &[&str] = &[
    "That sounds great!",
    "Haha, totally agree 😄",
    "Let me think about it and get back to you.",
    "Sure, see you then!",
    "Interesting, tell me more.",
];

/// Fixed pool of scripted replies, handed out in rotation.
#[derive(Debug, Clone)]
pub struct ReplyPool {
    replies: Vec<String>,
    cursor: usize,
}

impl ReplyPool {
    /// An empty list falls back to [`DEFAULT_REPLIES`].
    pub fn new(replies: Vec<String>) -> Self {
        let replies = if replies.is_empty() {
            DEFAULT_REPLIES.iter().map(|r| r.to_string()).collect()
        } else {
            replies
        };
        Self { replies, cursor: 0 }
    }

    pub fn next_reply(&mut self) -> String {
        let reply = self.replies[self.cursor % self.replies.len()].clone();
        self.cursor = (self.cursor + 1) % self.replies.len();
        reply
    }

    pub fn contains(&self, text: &str) -> bool {
        self.replies.iter().any(|r| r == text)
    }
}

impl Default for ReplyPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
