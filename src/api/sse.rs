//! Server-Sent Events for the thinking animation

use crate::thinking::{ThinkingEvent, ThinkingSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// One frame of the thinking stream
#[derive(Debug)]
enum Frame {
    /// Full state; sent first and again whenever the subscriber fell behind
    Init(ThinkingSnapshot),
    Event(ThinkingEvent),
}

/// Stream that starts with the current snapshot, then relays every event.
///
/// `resync` is called when the subscriber lags behind the broadcast buffer.
pub fn sse_stream(
    init: ThinkingSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<ThinkingEvent>,
    resync: impl Fn() -> ThinkingSnapshot + Send + 'static,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = frames(init, broadcast_rx, resync)
        .map(|frame| Ok::<_, Infallible>(frame_to_axum(&frame)));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn frames(
    init: ThinkingSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<ThinkingEvent>,
    resync: impl Fn() -> ThinkingSnapshot + Send + 'static,
) -> impl Stream<Item = Frame> {
    let init = futures::stream::once(async move { Frame::Init(init) });

    let broadcasts = BroadcastStream::new(broadcast_rx).map(move |result| match result {
        Ok(event) => Frame::Event(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "Thinking subscriber lagged, resending snapshot");
            Frame::Init(resync())
        }
    });

    init.chain(broadcasts)
}

fn frame_to_axum(frame: &Frame) -> Event {
    match frame {
        Frame::Init(snapshot) => Event::default()
            .event("init")
            .data(json!({ "type": "init", "snapshot": snapshot }).to_string()),
        Frame::Event(event) => {
            let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
            Event::default().event(event.event_type()).data(data)
        }
    }
}
