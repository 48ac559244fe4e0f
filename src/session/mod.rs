//! Ride session: state machine, quick navigation and the async runtime.

pub mod controller;
pub mod quick_nav;
pub mod runtime;
pub mod state;

// Re-export main types
pub use controller::RideController;
pub use quick_nav::{
    deep_link, DeepLinkHandler, GuidanceChoice, LogDeepLinkHandler, QuickNav, QuickNavError,
    QuickNavOutcome, QuickNavState,
};
pub use runtime::{RideCommand, RideHandle, RideRuntime};
pub use state::{banner_text, ActiveTarget, RideMode, RideSession, RideSnapshot, IDLE_BANNER};
