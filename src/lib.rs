// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Image-trailer state machine and swap-decision engine for dual-slot
//! firmware updaters.
//!
//! A device using this crate keeps two flash slots per image pair: the
//! *primary* slot it boots from and a *secondary* slot where application
//! firmware stages a candidate image. Each slot ends in a small fixed-layout
//! trailer ([`trailer`]); from the decoded trailers of both slots
//! ([`SwapState`]) the [`SwapManager`] derives the one decision the
//! bootloader needs on each boot: swap nothing, test the staged image once,
//! install it permanently, or revert an unconfirmed image.
//!
//! The crate supports both `no_std` (target) and `std` (host) environments:
//! - Default: `std` mode, which additionally provides the [`sim`] flash
//!   backend used by the test suite and host tooling
//! - `use-defmt` / `use-log` features: route the engine's advisory logging
//!   to defmt or to the `log` facade; with neither, logging compiles out
//! - `serde` feature: serialization derives on the public state types

#![cfg_attr(not(feature = "std"), no_std)]

pub mod area;
pub mod state;
pub mod swap;
pub mod trailer;

#[cfg(feature = "std")]
pub mod sim;

// Re-export commonly used types
pub use area::{AreaId, FlashArea, FlashMap};
pub use state::{Flag, Magic, SwapState, SwapType, read_swap_state};
pub use swap::{FlagPattern, MagicPattern, NoHook, SwapManager, SwapStateHook};

use core::fmt;

/// Result type for trailer and flash operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the trailer codec and the update API.
///
/// The decision engine itself never returns an `Error`; it folds every
/// failure into [`SwapType::Panic`] so the bootloader always receives a
/// single deterministic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Error {
    /// An underlying flash operation failed, or the backend reported a
    /// nonsense geometry (write alignment of zero).
    Flash,
    /// A slot trailer was observed in a corrupt state where the operation
    /// expected a coherent one.
    BadImage,
    /// Confirmation found a corrupt magic on the primary slot.
    BadVector,
    /// A trailer write larger than the reserved field block was requested.
    Invalid,
}

impl Error {
    /// Stable numeric code, for callers that report status over a wire.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Flash => 1,
            Self::BadImage => 2,
            Self::BadVector => 3,
            Self::Invalid => 4,
        }
    }

    /// Short description of the error.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Flash => "flash operation failed",
            Self::BadImage => "slot trailer corrupt",
            Self::BadVector => "primary slot trailer corrupt",
            Self::Invalid => "write exceeds trailer field block",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl core::error::Error for Error {}

// Advisory logging. Log statements never change an operation's outcome;
// with neither backend feature enabled they compile to nothing.

#[cfg(feature = "use-defmt")]
pub(crate) use defmt as log;

#[cfg(all(feature = "use-log", not(feature = "use-defmt")))]
pub(crate) use logger as log;

#[cfg(not(any(feature = "use-defmt", feature = "use-log")))]
pub(crate) mod log {
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }
    pub(crate) use debug;
    macro_rules! info {
        ($($arg:tt)*) => {};
    }
    pub(crate) use info;
    macro_rules! warner {
        ($($arg:tt)*) => {};
    }
    pub(crate) use warner as warn;
}
