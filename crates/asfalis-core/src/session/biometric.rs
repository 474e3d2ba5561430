//! Platform biometric seam.
//!
//! Enrollment, hardware checks and the prompt itself belong to the platform.
//! The session manager only asks whether a prompt can be shown, awaits its
//! outcome, and cancels it when the session it was guarding goes away.

use std::fmt;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricAvailability {
    Available,
    /// Hardware present but nothing enrolled.
    NoneEnrolled,
    NoHardware,
    HardwareUnavailable,
}

impl fmt::Display for BiometricAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BiometricAvailability::Available => "available",
            BiometricAvailability::NoneEnrolled => "no biometric credential is enrolled",
            BiometricAvailability::NoHardware => "this device has no biometric hardware",
            BiometricAvailability::HardwareUnavailable => "biometric hardware is unavailable",
        };
        f.write_str(text)
    }
}

/// Terminal outcome of one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiometricOutcome {
    Succeeded,
    /// The presented biometric was not recognized.
    Failed,
    /// Platform error, including user cancellation.
    Error(String),
}

#[async_trait]
pub trait BiometricPrompt: Send + Sync {
    fn availability(&self) -> BiometricAvailability;

    /// Show the prompt and wait for its outcome.
    async fn authenticate(&self) -> BiometricOutcome;

    /// Dismiss a prompt that is still showing.
    fn cancel(&self);
}
