//! # Event Bus System
//!
//! Provides an event-driven architecture for the sonification core using
//! `tokio::sync::broadcast`. This module enables decoupled communication
//! between core modules through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐
//! │ Decode Task ├──────────────>│           │
//! └─────────────┘               │           │
//!                               │ EventBus  │
//! ┌─────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │ Sound Clip  ├──────────────>│  channel) ├─────────────────>│ Subscriber │
//! └─────────────┘               │           │                  └────────────┘
//!                               │           │
//! ┌─────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │Sound Manager├──────────────>│           ├─────────────────>│ Subscriber │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Creating an Event Bus
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! let event_bus = EventBus::new(100); // Buffer size of 100 events
//! ```
//!
//! ### Publishing Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, SonicEvent, ManagerEvent};
//!
//! # let event_bus = EventBus::new(100);
//! let event = SonicEvent::Manager(ManagerEvent::MasterGainChanged { gain: 0.5 });
//!
//! event_bus.emit(event).ok();
//! ```
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, SonicEvent};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {:?}", event),
//!             Err(RecvError::Lagged(n)) => {
//!                 eprintln!("Missed {} events", n);
//!             }
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Decode Events
//! - `Completed`: Asset decoding finished and the buffer is available
//! - `FellBack`: Decoding failed and the generator substituted silence
//!
//! ### Generator Events
//! - `InstanceStarted`: A playback instance began on the audio graph
//! - `InstanceEnded`: A playback instance finished or was stopped
//! - `RequestDeferred`: A trigger arrived before the buffer resolved
//! - `PlaySuppressed`: A trigger was dropped because output is disabled
//!
//! ### Manager Events
//! - `Registered` / `Unregistered`: Generator registry membership changed
//! - `MasterEnabledChanged` / `MasterGainChanged`: Master output settings changed
//! - `LevelEnabledChanged` / `LevelGainChanged`: Per-level settings changed
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Subscribers should handle `Lagged` gracefully and treat `Closed` as a signal to exit.
//!
//! ## Thread Safety
//!
//! The event bus is fully thread-safe (`Send + Sync`). It can be safely shared across
//! async tasks using `Arc`:
//!
//! ```no_run
//! use std::sync::Arc;
//! use core_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = Arc::new(EventBus::new(100));
//! let bus_clone = Arc::clone(&event_bus);
//!
//! tokio::spawn(async move {
//!     // Use bus_clone in spawned task
//! });
//! # }
//! ```

use crate::config::SonificationLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// This value balances memory usage with the ability to handle bursts of events.
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
/// It wraps domain-specific event types for different modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum SonicEvent {
    /// Asset decoding events
    Decode(DecodeEvent),
    /// Playback instance events from individual generators
    Generator(GeneratorEvent),
    /// Registry and gain policy events
    Manager(ManagerEvent),
}

impl SonicEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            SonicEvent::Decode(e) => e.description(),
            SonicEvent::Generator(e) => e.description(),
            SonicEvent::Manager(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            SonicEvent::Decode(DecodeEvent::FellBack { .. }) => EventSeverity::Warning,
            SonicEvent::Manager(ManagerEvent::MasterEnabledChanged { .. })
            | SonicEvent::Manager(ManagerEvent::MasterGainChanged { .. })
            | SonicEvent::Manager(ManagerEvent::LevelEnabledChanged { .. })
            | SonicEvent::Manager(ManagerEvent::LevelGainChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Decode Events
// ============================================================================

/// Events describing the outcome of asset decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum DecodeEvent {
    /// Decoding finished and the buffer is ready for playback.
    Completed {
        /// The generator whose asset was decoded.
        generator: Uuid,
        /// Number of frames in the decoded buffer.
        frames: usize,
        /// Sample rate of the decoded buffer in Hz.
        sample_rate: u32,
        /// Number of interleaved channels.
        channels: u16,
    },
    /// Decoding failed and the generator substituted a silent buffer.
    ///
    /// The generator stays usable; its triggers play silence.
    FellBack {
        /// The generator whose asset failed to decode.
        generator: Uuid,
        /// Human-readable reason for the fallback.
        message: String,
    },
}

impl DecodeEvent {
    fn description(&self) -> &str {
        match self {
            DecodeEvent::Completed { .. } => "Asset decoded",
            DecodeEvent::FellBack { .. } => "Decode failed, using silence",
        }
    }
}

// ============================================================================
// Generator Events
// ============================================================================

/// Events emitted by individual sound generators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum GeneratorEvent {
    /// A playback instance began on the audio graph.
    InstanceStarted {
        /// The generator that started the instance.
        generator: Uuid,
        /// The audio graph voice backing the instance.
        voice: Uuid,
        /// Whether the instance started silenced because its level is disabled.
        muted: bool,
    },
    /// A playback instance finished or was stopped.
    InstanceEnded {
        /// The generator that owned the instance.
        generator: Uuid,
        /// The audio graph voice that ended.
        voice: Uuid,
        /// Whether the instance ran to natural completion.
        completed: bool,
    },
    /// A trigger arrived before the buffer resolved and was deferred.
    RequestDeferred {
        /// The generator that deferred the trigger.
        generator: Uuid,
    },
    /// A trigger was dropped because output is disabled for this generator.
    PlaySuppressed {
        /// The generator that suppressed the trigger.
        generator: Uuid,
    },
}

impl GeneratorEvent {
    fn description(&self) -> &str {
        match self {
            GeneratorEvent::InstanceStarted { .. } => "Playback instance started",
            GeneratorEvent::InstanceEnded { .. } => "Playback instance ended",
            GeneratorEvent::RequestDeferred { .. } => "Trigger deferred until decode",
            GeneratorEvent::PlaySuppressed { .. } => "Trigger suppressed while disabled",
        }
    }
}

// ============================================================================
// Manager Events
// ============================================================================

/// Events describing registry membership and gain policy changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum ManagerEvent {
    /// A generator was registered with the manager.
    Registered {
        /// The generator that was registered.
        generator: Uuid,
        /// The sonification level it was registered under.
        level: SonificationLevel,
    },
    /// A generator was removed from the registry.
    Unregistered {
        /// The generator that was removed.
        generator: Uuid,
    },
    /// The master mute state changed.
    MasterEnabledChanged {
        /// The new mute state.
        enabled: bool,
    },
    /// The master gain changed.
    MasterGainChanged {
        /// The new master gain (0.0..=1.0).
        gain: f32,
    },
    /// Per-level enablement changed.
    LevelEnabledChanged {
        /// The affected level.
        level: SonificationLevel,
        /// The new enablement state.
        enabled: bool,
    },
    /// Per-level gain changed.
    LevelGainChanged {
        /// The affected level.
        level: SonificationLevel,
        /// The new level gain (0.0..=1.0).
        gain: f32,
    },
}

impl ManagerEvent {
    fn description(&self) -> &str {
        match self {
            ManagerEvent::Registered { .. } => "Generator registered",
            ManagerEvent::Unregistered { .. } => "Generator unregistered",
            ManagerEvent::MasterEnabledChanged { .. } => "Master output toggled",
            ManagerEvent::MasterGainChanged { .. } => "Master gain changed",
            ManagerEvent::LevelEnabledChanged { .. } => "Level enablement changed",
            ManagerEvent::LevelGainChanged { .. } => "Level gain changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, SonicEvent, ManagerEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let event_bus = EventBus::new(100);
///
/// // Subscribe to events
/// let mut subscriber1 = event_bus.subscribe();
/// let mut subscriber2 = event_bus.subscribe();
///
/// // Emit an event
/// let event = SonicEvent::Manager(ManagerEvent::MasterEnabledChanged { enabled: false });
/// event_bus.emit(event).ok();
///
/// // Both subscribers receive the event
/// # tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SonicEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_runtime::events::{EventBus, SonicEvent, ManagerEvent};
    ///
    /// let event_bus = EventBus::new(100);
    /// let event = SonicEvent::Manager(ManagerEvent::MasterGainChanged { gain: 0.8 });
    ///
    /// match event_bus.emit(event) {
    ///     Ok(n) => println!("Event sent to {} subscribers", n),
    ///     Err(_) => println!("No active subscribers"),
    /// }
    /// ```
    pub fn emit(&self, event: SonicEvent) -> Result<usize, SendError<SonicEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<SonicEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&SonicEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// This provides a more ergonomic API for consuming events with optional filtering
/// by event type or severity.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, SonicEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe());
///
/// // Filter for decode events only
/// let mut decode_stream = stream.filter(|event| {
///     matches!(event, SonicEvent::Decode(_))
/// });
/// # }
/// ```
pub struct EventStream {
    receiver: Receiver<SonicEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<SonicEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SonicEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// This will skip events that don't match the filter and return the next matching event.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<SonicEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            // If no filter, return immediately
            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            // Apply filter
            if filter(&event) {
                return Ok(event);
            }

            // Event didn't match filter, continue to next event
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<SonicEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    // If no filter, return immediately
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    // Apply filter
                    if filter(&event) {
                        return Some(Ok(event));
                    }

                    // Event didn't match filter, continue
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
