//! The debounced write-through state machine.
//!
//! Filter and sort edits apply locally at once and schedule a full write of
//! the view. Each edit restarts the window; only the timer belonging to the
//! latest edit may start a write.
//!
//! ```text
//!            edit                  timer (current)          ok
//!   Idle ───────────▶ Scheduled ─────────────────▶ InFlight ───▶ Idle
//!    ▲                 │  ▲  │ edit                   │
//!    │   timer while   │  └──┘                        │ err
//!    └─ write busy ────┘                              ▼
//!                                                   Failed ── edit ──▶ Scheduled
//! ```

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// How long an edit waits for further edits before it is written.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
  Idle,
  Scheduled {
    view_id:    Uuid,
    deadline:   Instant,
    generation: u64,
  },
  InFlight {
    view_id:    Uuid,
    generation: u64,
  },
  Failed {
    view_id: Uuid,
    message: String,
  },
}

/// What a timer should do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fire {
  /// Write the view now.
  Start(Uuid),
  /// A newer edit superseded this timer.
  Stale,
  /// Another write holds the single-flight guard; the edit is dropped. The
  /// local copy keeps it only until the next refetch.
  Busy,
}

/// Returned by [`Debouncer::schedule`]; the timer task sleeps until
/// `deadline` and then reports `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
  pub deadline:   Instant,
  pub generation: u64,
}

#[derive(Debug)]
pub struct Debouncer {
  state:      PendingWrite,
  generation: u64,
  window:     Duration,
}

impl Default for Debouncer {
  fn default() -> Self { Self::new(DEBOUNCE_WINDOW) }
}

impl Debouncer {
  pub fn new(window: Duration) -> Self {
    Self { state: PendingWrite::Idle, generation: 0, window }
  }

  pub fn state(&self) -> &PendingWrite { &self.state }

  /// The view whose local edits have not been confirmed by the store yet.
  pub fn dirty_view(&self) -> Option<Uuid> {
    match self.state {
      PendingWrite::Scheduled { view_id, .. }
      | PendingWrite::InFlight { view_id, .. } => Some(view_id),
      PendingWrite::Idle | PendingWrite::Failed { .. } => None,
    }
  }

  /// Record an edit to `view_id` at `now`, restarting the window.
  pub fn schedule(&mut self, view_id: Uuid, now: Instant) -> Ticket {
    self.generation += 1;
    let deadline = now + self.window;
    self.state = PendingWrite::Scheduled {
      view_id,
      deadline,
      generation: self.generation,
    };
    Ticket { deadline, generation: self.generation }
  }

  /// A timer for `generation` expired.
  pub fn fire(&mut self, generation: u64, write_busy: bool) -> Fire {
    let view_id = match self.state {
      PendingWrite::Scheduled { view_id, generation: current, .. }
        if current == generation =>
      {
        view_id
      }
      _ => return Fire::Stale,
    };

    if write_busy {
      self.state = PendingWrite::Idle;
      return Fire::Busy;
    }
    self.state = PendingWrite::InFlight { view_id, generation };
    Fire::Start(view_id)
  }

  /// The write started by `generation` completed. A newer schedule made
  /// while the write was in flight is left in place.
  pub fn finish(&mut self, generation: u64, outcome: Result<(), String>) {
    let view_id = match self.state {
      PendingWrite::InFlight { view_id, generation: current }
        if current == generation =>
      {
        view_id
      }
      _ => return,
    };
    self.state = match outcome {
      Ok(()) => PendingWrite::Idle,
      Err(message) => PendingWrite::Failed { view_id, message },
    };
  }
}
