pub mod connection;
pub mod entities;
pub mod repositories;

/// Parse a JSON text column, naming the column in the error.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> anyhow::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("Corrupt {} column: {}", column, e))
}
