//! Streaming delivery over the ReAct Loop Executor.
//!
//! `reactor-turn::Provider` has no wire-level streaming method — every
//! provider implementation in this workspace returns one complete
//! `ProviderResponse` per call. The Streaming Executor therefore runs the
//! same loop [`Engine::run`] runs and delivers the terminal response
//! incrementally by chunking it, rather than by relaying provider-native
//! server-sent events. Tool activity is reported as it completes.

use crate::engine::Engine;
use reactor_core::command::AgentCommand;
use reactor_core::result::AgentResult;
use reactor_turn::provider::Provider;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

/// One increment of a streamed execution.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A chunk of the terminal response's text.
    TextDelta(String),
    /// A tool call completed during the loop.
    ToolCallCompleted {
        /// The tool call id (echoes `ToolResult::id`).
        id: String,
        /// Whether the call succeeded.
        success: bool,
    },
    /// The execution finished; carries the full `AgentResult`.
    Done(AgentResult),
}

/// Target chunk size, in bytes, for `TextDelta` events.
const CHUNK_SIZE: usize = 40;

/// Run `command` against `engine`, streaming the terminal response in
/// chunks instead of returning it all at once.
///
/// Rejects up front (a `Done` event carrying a failed `AgentResult`, with
/// no further events) when the command's `response_format` is
/// `streaming_incompatible_with_format` — only `Text` responses can be
/// chunked meaningfully mid-stream.
pub fn run_streaming<P: Provider + Send + Sync + 'static>(
    engine: std::sync::Arc<Engine<P>>,
    command: AgentCommand,
) -> impl Stream<Item = StreamEvent> {
    let (tx, rx) = mpsc::channel(32);

    if command.streaming_incompatible_with_format() {
        let duration = reactor_core::DurationMs::ZERO;
        let result = AgentResult::failure(
            reactor_core::result::ErrorCode::InvalidResponse,
            "streaming only supports the Text response format",
            duration,
        );
        let _ = tx.try_send(StreamEvent::Done(result));
        return ReceiverStream::new(rx);
    }

    tokio::spawn(async move {
        let result = engine.run(command).await;
        for name in &result.tools_used {
            let _ = tx
                .send(StreamEvent::ToolCallCompleted {
                    id: name.clone(),
                    success: result.success,
                })
                .await;
        }
        if let Some(content) = &result.content {
            for chunk in chunk_text(content, CHUNK_SIZE) {
                if tx.send(StreamEvent::TextDelta(chunk)).await.is_err() {
                    return;
                }
            }
        }
        let _ = tx.send(StreamEvent::Done(result)).await;
    });

    ReceiverStream::new(rx)
}

fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    while start < bytes.len() {
        let mut end = (start + size).min(bytes.len());
        while end < bytes.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(text[start..end].to_string());
        start = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_splits_on_char_boundaries() {
        let text = "a".repeat(100);
        let chunks = chunk_text(&text, 40);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 40);
        assert_eq!(chunks[2].len(), 20);
    }

    #[test]
    fn chunk_text_empty_input_yields_no_chunks() {
        assert!(chunk_text("", 40).is_empty());
    }
}
