//! Terminal event stream.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use crossterm::event::EventStream;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use super::Event;

/// Stream of terminal events interleaved with ticks.
pub struct EventHandler {
    events: UnboundedReceiverStream<Event>,
}

impl EventHandler {
    /// Spawn the reader task. It stops once the handler is dropped.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);

            loop {
                let event = tokio::select! {
                    _ = tick.tick() => Event::Tick,
                    maybe_event = reader.next() => match maybe_event {
                        Some(Ok(event)) => match Event::from_terminal(event) {
                            Some(event) => event,
                            None => continue,
                        },
                        Some(Err(e)) => {
                            warn!(error = %e, "failed to read terminal event");
                            continue;
                        }
                        None => break,
                    },
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self {
            events: UnboundedReceiverStream::new(rx),
        }
    }
}

impl Stream for EventHandler {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}
