//! Node execution wrapper and helpers shared by the analysis nodes

use anyhow::{Context, Result};
use futures::Future;
use pitch_panda_sdk::{log_node_complete, log_node_failed, log_node_start};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::StateUpdate;

/// Run a node and convert a failure into `fallback` plus an error.
///
/// The error string is `"<name> failed: <cause chain>"`.
pub async fn execute_node<Fut>(name: &str, fallback: StateUpdate, node: Fut) -> StateUpdate
where
    Fut: Future<Output = Result<StateUpdate>>,
{
    log_node_start!(name, format!("Running {}", name));
    tracing::debug!(node = name, "node started");

    match node.await {
        Ok(update) => {
            if update.errors.is_empty() {
                log_node_complete!(name);
            } else {
                log_node_complete!(name, format!("{} warning(s)", update.errors.len()));
            }
            update
        }
        Err(e) => {
            let message = format!("{} failed: {:#}", name, e);
            tracing::warn!("{}", message);
            log_node_failed!(name, &message);
            fallback.with_error(message)
        }
    }
}

/// Deserialize a model answer that may wrap the payload in a `{"<key>": ...}` envelope
pub fn from_wrapped<T: DeserializeOwned>(value: Value, key: &str) -> Result<T> {
    let value = match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(key) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(value).with_context(|| format!("Unexpected '{}' payload shape", key))
}

/// Numbered list used inside prompts, `None available.` when empty
pub fn numbered<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect();

    if lines.is_empty() {
        "None available.".to_string()
    } else {
        lines.join("\n")
    }
}
