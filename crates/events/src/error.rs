/// Errors surfaced by the event bus to its users.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The bus has been shut down; no further messages can be exchanged.
    #[error("Event bus is closed")]
    Closed,

    /// A subscription was requested without any topic.
    #[error("A subscription needs at least one topic")]
    NoTopics,

    /// A payload on `topic` could not be decoded into the expected message.
    #[error("Malformed payload on topic '{topic}': {source}")]
    Malformed {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// A message could not be encoded before publishing.
    #[error("Failed to serialize message for topic '{topic}': {source}")]
    Serialization {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
}
