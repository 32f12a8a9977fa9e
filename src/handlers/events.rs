use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::state::AppState;

fn screen_event<T: serde::Serialize>(value: &T) -> Event {
    let data = serde_json::to_string(value).unwrap_or_default();
    Event::default().data(data).event("screen")
}

// GET /api/events
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    // Subscribe first so no transition is lost between the snapshot and the stream
    let rx = state.orchestrator.subscribe_screens();
    let current = state.orchestrator.screen().await;

    let initial = tokio_stream::once(Ok::<_, Infallible>(screen_event(&current)));

    let live = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(screen) => Some(Ok(screen_event(&screen))),
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Sse::new(initial.chain(live).merge(keepalive))
}
