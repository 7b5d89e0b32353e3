//! Fan-out of one serialized payload to many clients.
//!
//! Each client has its own bounded queue drained by its own writer task, so
//! enqueueing never waits on a slow socket. A client whose queue is closed has
//! lost its writer, and one whose queue is full has stalled; either is dropped
//! from the registry on the spot.

use tokio::sync::mpsc::error::TrySendError;

use super::registry::{ClientId, ConnectionRegistry, Frame};

/// Deliver to every registered client. Returns how many accepted the frame.
pub fn broadcast_all(registry: &mut ConnectionRegistry, frame: &Frame) -> usize {
    fan_out(registry, frame, None)
}

/// Deliver to every registered client except `excluded`.
pub fn broadcast_except(
    registry: &mut ConnectionRegistry,
    frame: &Frame,
    excluded: ClientId,
) -> usize {
    fan_out(registry, frame, Some(excluded))
}

fn fan_out(registry: &mut ConnectionRegistry, frame: &Frame, excluded: Option<ClientId>) -> usize {
    if registry.is_empty() {
        return 0;
    }
    let mut delivered = 0;
    let mut dead = Vec::new();
    for (id, tx) in registry.iter() {
        if Some(*id) == excluded {
            continue;
        }
        match tx.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(client = %id, "client stalled, outbound queue full");
                dead.push(*id);
            }
            Err(TrySendError::Closed(_)) => dead.push(*id),
        }
    }
    for id in dead {
        registry.unregister(id);
        tracing::debug!(client = %id, "pruned client");
    }
    delivered
}
