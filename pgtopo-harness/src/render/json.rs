//! JSON renderer.
//!
//! Produces an object keyed by server address, one entry per record.

use pgtopo::Snapshot;

/// Render a snapshot as compact JSON followed by a newline.
pub fn render(snapshot: &Snapshot) -> String {
    match serde_json::to_string(snapshot) {
        Ok(mut body) => {
            body.push('\n');
            body
        }
        Err(e) => format!("{{\"error\": \"Failed to serialize topology: {}\"}}\n", e),
    }
}
