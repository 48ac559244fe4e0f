//! Quick-navigation flow.
//!
//! `Closed -> Picking -> Choosing -> Closed`. The internal choice yields an
//! [`ActiveTarget`]; the external choice yields a deep link and leaves the
//! ride session alone.

use super::ActiveTarget;
use crate::config::Destination;
use crate::geo::LatLng;
use crate::routing::provider::synthetic_destination;
use thiserror::Error;

/// Errors raised by out-of-order quick-nav actions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuickNavError {
    #[error("Destination picker is not open")]
    NotOpen,

    #[error("No destination selected")]
    NoSelection,

    #[error("Unknown destination index {0}")]
    UnknownDestination(usize),
}

/// Where guidance to the chosen destination happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidanceChoice {
    /// Guide inside the ride screen
    Internal,
    /// Hand off to an external map application
    External,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum QuickNavState {
    #[default]
    Closed,
    Picking,
    Choosing(Destination),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuickNavOutcome {
    Internal(ActiveTarget),
    /// Deep link to open
    External(String),
}

/// Receives external navigation handoffs. Fire-and-forget.
pub trait DeepLinkHandler: Send {
    fn open(&self, url: &str);
}

/// Handler that only logs the link
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDeepLinkHandler;

impl DeepLinkHandler for LogDeepLinkHandler {
    fn open(&self, url: &str) {
        tracing::info!("External navigation: {}", url);
    }
}

/// External navigation URL for a destination.
pub fn deep_link(destination: LatLng) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}&travelmode=driving",
        destination.lat, destination.lng
    )
}

#[derive(Debug, Default)]
pub struct QuickNav {
    state: QuickNavState,
    destinations: Vec<Destination>,
}

impl QuickNav {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self {
            state: QuickNavState::Closed,
            destinations,
        }
    }

    pub fn state(&self) -> &QuickNavState {
        &self.state
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Open the picker.
    pub fn open(&mut self) -> &[Destination] {
        self.state = QuickNavState::Picking;
        &self.destinations
    }

    /// Pick a candidate from the open picker.
    pub fn select(&mut self, index: usize) -> Result<&Destination, QuickNavError> {
        if matches!(self.state, QuickNavState::Closed) {
            return Err(QuickNavError::NotOpen);
        }
        let destination = self
            .destinations
            .get(index)
            .ok_or(QuickNavError::UnknownDestination(index))?;
        self.state = QuickNavState::Choosing(destination.clone());
        Ok(destination)
    }

    /// Resolve the binary choice and close the picker.
    ///
    /// `from` is used to place destinations without a fixed location.
    pub fn choose(
        &mut self,
        choice: GuidanceChoice,
        from: LatLng,
    ) -> Result<QuickNavOutcome, QuickNavError> {
        let destination = match std::mem::take(&mut self.state) {
            QuickNavState::Choosing(d) => d,
            QuickNavState::Picking => {
                self.state = QuickNavState::Picking;
                return Err(QuickNavError::NoSelection);
            }
            QuickNavState::Closed => return Err(QuickNavError::NotOpen),
        };

        Ok(match choice {
            GuidanceChoice::Internal => QuickNavOutcome::Internal(ActiveTarget::new(
                destination.name,
                destination.distance_km,
            )),
            GuidanceChoice::External => {
                let location = destination.location.unwrap_or_else(|| {
                    synthetic_destination(from, &destination.name, destination.distance_km)
                });
                QuickNavOutcome::External(deep_link(location))
            }
        })
    }

    pub fn close(&mut self) {
        self.state = QuickNavState::Closed;
    }
}
