use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait ValidationClient {
    /// POSTs `body` as JSON and returns the raw reply, whatever its status.
    fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, String>;
}
