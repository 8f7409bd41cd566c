//! Server-sent cart events.
//!
//! Each open page subscribes to `/cart/events` for its own session; the
//! header badge re-fetches `/cart/count` whenever a `cart-updated` event
//! arrives. A visitor only hears about their own cart.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use tower_sessions::Session;
use tracing::debug;

use crate::routes::CART_UPDATED_EVENT;
use crate::services::session::get_or_create_session_token;
use crate::state::AppState;

/// Stream `cart-updated` events for the visitor's cart until the client
/// disconnects.
///
/// A visitor without a token gets one here, so the cart they fill later
/// is the one this stream follows.
pub async fn cart_events(
    State(state): State<AppState>,
    session: Session,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let token = get_or_create_session_token(&session).await;
    let subscription = state.notifier().subscribe(token);
    debug!(
        subscribers = state.notifier().subscriber_count(),
        "Cart event stream opened"
    );

    let stream = subscription
        .into_stream()
        .map(|_| Ok(Event::default().event(CART_UPDATED_EVENT).data("changed")));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
