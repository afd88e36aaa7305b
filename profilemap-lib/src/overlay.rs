//! Presentation state for the map overlay.
//!
//! Asking for a profile's map first shows a loading indicator and only reveals
//! the map once a fixed delay has passed. The transitions are
//! `Idle -> Loading -> Ready`, and closing at any point returns to `Idle`,
//! dropping whatever was pending. Time is passed in by the caller, so nothing
//! here sleeps and the profile store is never involved.

use crate::profile::Profile;
use std::time::{Duration, Instant};

pub const MAP_REVEAL_DELAY: Duration = Duration::from_millis(500);

/// What the map display collaborator needs to draw one profile.
#[derive(Clone, Debug, PartialEq)]
pub struct MapTarget {
    pub id: String,
    pub label: String,
    pub formatted: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Profile> for MapTarget {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            label: profile.name.clone(),
            formatted: profile.address.formatted.clone(),
            lat: profile.address.lat,
            lng: profile.address.lng,
        }
    }
}

/// Draws a map centred on a target. Has no access to the store.
pub trait MapDisplay {
    type Error;

    fn display(&mut self, target: &MapTarget) -> Result<(), Self::Error>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum OverlayState {
    Idle,
    Loading {
        target: MapTarget,
        requested_at: Instant,
    },
    Ready(MapTarget),
}

#[derive(Clone, Debug)]
pub struct MapOverlay {
    state: OverlayState,
    delay: Duration,
}

impl Default for MapOverlay {
    fn default() -> Self {
        Self::new(MAP_REVEAL_DELAY)
    }
}

impl MapOverlay {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: OverlayState::Idle,
            delay,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, OverlayState::Loading { .. })
    }

    /// Start loading the map for `profile`, replacing anything pending or shown.
    pub fn show(&mut self, profile: &Profile, now: Instant) {
        self.state = OverlayState::Loading {
            target: MapTarget::from(profile),
            requested_at: now,
        };
    }

    /// Reveal the pending target if its delay has passed.
    pub fn poll(&mut self, now: Instant) -> &OverlayState {
        if let OverlayState::Loading {
            target,
            requested_at,
        } = &self.state
        {
            if now.saturating_duration_since(*requested_at) >= self.delay {
                self.state = OverlayState::Ready(target.clone());
            }
        }
        &self.state
    }

    /// Time left before the pending target is revealed. `None` unless loading.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            OverlayState::Loading { requested_at, .. } => Some(
                self.delay
                    .saturating_sub(now.saturating_duration_since(*requested_at)),
            ),
            _ => None,
        }
    }

    pub fn close(&mut self) {
        self.state = OverlayState::Idle;
    }
}
