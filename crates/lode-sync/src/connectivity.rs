//! Connectivity as an injectable observable.
//!
//! The platform's network signal is fed into a [`ConnectivityMonitor`];
//! everything else reads it through the [`Connectivity`] trait. Subscribers
//! are woken only on transitions, never for a repeated report of the same
//! state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityState {
  pub is_online:    bool,
  /// Offline→online transitions since the monitor was created. A subscriber
  /// that falls behind compares counts instead of inspecting `is_online`.
  pub online_edges: u64,
}

pub trait Connectivity: Send + Sync {
  /// Best-effort snapshot of the last reported state.
  fn current(&self) -> ConnectivityState;

  /// A receiver that changes once per transition.
  fn subscribe(&self) -> watch::Receiver<ConnectivityState>;

  fn is_online(&self) -> bool { self.current().is_online }
}

/// The single writer of the process-wide connectivity flag.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
  tx: Arc<watch::Sender<ConnectivityState>>,
}

impl ConnectivityMonitor {
  pub fn new(is_online: bool) -> Self {
    let (tx, _) = watch::channel(ConnectivityState { is_online, online_edges: 0 });
    Self { tx: Arc::new(tx) }
  }

  /// Report the platform's current network state. Returns whether this was
  /// a transition.
  pub fn set_online(&self, is_online: bool) -> bool {
    let changed = self.tx.send_if_modified(|state| {
      if state.is_online == is_online {
        return false;
      }
      state.is_online = is_online;
      if is_online {
        state.online_edges += 1;
      }
      true
    });
    if changed {
      info!(is_online, "connectivity changed");
    }
    changed
  }
}

impl Connectivity for ConnectivityMonitor {
  fn current(&self) -> ConnectivityState { *self.tx.borrow() }

  fn subscribe(&self) -> watch::Receiver<ConnectivityState> { self.tx.subscribe() }
}
