#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} feed used before init")]
    NotInitialized(&'static str),
    #[error("arcade context can only be started once")]
    AlreadyStarted,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("indexer responded with {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("event stream buffered more than {limit} bytes without completing an event")]
    EventTooLarge { limit: usize },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("invalid config `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
