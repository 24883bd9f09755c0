// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Swap-decision engine and the application-facing update API.
//!
//! [`SwapManager`] reads the [`SwapState`] of both slots of an image pair
//! and classifies the required operation by walking the built-in rule table
//! in declared order. It also exposes the two operations firmware uses during
//! normal operation: staging the secondary image ([`set_pending_multi`])
//! and confirming the running primary image ([`set_confirmed_multi`]).
//!
//! [`set_pending_multi`]: SwapManager::set_pending_multi
//! [`set_confirmed_multi`]: SwapManager::set_confirmed_multi

use crate::area::{AreaId, FlashArea, FlashMap};
use crate::log;
use crate::state::{self, Flag, Magic, SwapState, SwapType};
use crate::trailer;
use crate::{Error, Result};

/// Pattern over a magic value in a decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicPattern {
    /// Matches any magic value.
    Any,
    /// Matches everything except [`Magic::Good`].
    NotGood,
    /// Matches [`Magic::Good`] exactly.
    Good,
    /// Matches [`Magic::Unset`] exactly.
    Unset,
}

impl MagicPattern {
    /// Compatibility predicate between a rule field and an observed value.
    #[must_use]
    pub fn matches(self, value: Magic) -> bool {
        match self {
            Self::Any => true,
            Self::NotGood => value != Magic::Good,
            Self::Good => value == Magic::Good,
            Self::Unset => value == Magic::Unset,
        }
    }
}

/// Pattern over a flag value in a decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagPattern {
    /// Matches any flag value.
    Any,
    /// Matches [`Flag::Set`] exactly.
    Set,
    /// Matches [`Flag::Unset`] exactly.
    Unset,
}

impl FlagPattern {
    /// Compatibility predicate between a rule field and an observed value.
    #[must_use]
    pub fn matches(self, value: Flag) -> bool {
        match self {
            Self::Any => true,
            Self::Set => value == Flag::Set,
            Self::Unset => value == Flag::Unset,
        }
    }
}

struct SwapRule {
    primary_magic: MagicPattern,
    secondary_magic: MagicPattern,
    primary_image_ok: FlagPattern,
    secondary_image_ok: FlagPattern,
    primary_copy_done: FlagPattern,
    swap_type: SwapType,
}

impl SwapRule {
    fn matches(&self, primary: &SwapState, secondary: &SwapState) -> bool {
        self.primary_magic.matches(primary.magic)
            && self.secondary_magic.matches(secondary.magic)
            && self.primary_image_ok.matches(primary.image_ok)
            && self.secondary_image_ok.matches(secondary.image_ok)
            && self.primary_copy_done.matches(primary.copy_done)
    }
}

/// Trailer states that require bootloader action, walked in declared order.
///
/// The order is load-bearing: a staged secondary image is a new user intent
/// and supersedes whatever state the primary slot inherited, so the
/// secondary-magic rules come first. States matching no rule need no
/// action.
const SWAP_RULES: [SwapRule; 3] = [
    SwapRule {
        primary_magic: MagicPattern::Any,
        secondary_magic: MagicPattern::Good,
        primary_image_ok: FlagPattern::Any,
        secondary_image_ok: FlagPattern::Unset,
        primary_copy_done: FlagPattern::Any,
        swap_type: SwapType::Test,
    },
    SwapRule {
        primary_magic: MagicPattern::Any,
        secondary_magic: MagicPattern::Good,
        primary_image_ok: FlagPattern::Any,
        secondary_image_ok: FlagPattern::Set,
        primary_copy_done: FlagPattern::Any,
        swap_type: SwapType::Perm,
    },
    SwapRule {
        primary_magic: MagicPattern::Good,
        secondary_magic: MagicPattern::Unset,
        primary_image_ok: FlagPattern::Unset,
        secondary_image_ok: FlagPattern::Any,
        primary_copy_done: FlagPattern::Set,
        swap_type: SwapType::Revert,
    },
];

/// Override point for sourcing the primary slot's state without a flash
/// read, e.g. from a secure-boot measurement cached by the platform.
pub trait SwapStateHook {
    /// Return `Some` to supply the state, `None` to fall through to the
    /// flash backend.
    fn primary_state(&mut self, image_index: u8) -> Option<Result<SwapState>> {
        let _ = image_index;
        None
    }
}

/// Default hook that always falls through to the flash backend.
pub struct NoHook;

impl SwapStateHook for NoHook {}

/// Trailer state machine over the slots of a flash map.
///
/// One manager serves every image pair of the map. Operations open a slot
/// for the duration of a single call; callers running concurrent updates on
/// the same slot must serialise externally.
pub struct SwapManager<M: FlashMap, H: SwapStateHook = NoHook> {
    map: M,
    hook: H,
}

impl<M: FlashMap> SwapManager<M, NoHook> {
    /// Build a manager reading both slots from `map`.
    pub fn new(map: M) -> Self {
        Self { map, hook: NoHook }
    }
}

impl<M: FlashMap, H: SwapStateHook> SwapManager<M, H> {
    /// Build a manager that offers `hook` the primary-state read first.
    pub fn with_hook(map: M, hook: H) -> Self {
        Self { map, hook }
    }

    /// Open the area with the given id, decode its trailer, and release it.
    pub fn read_swap_state_by_id(&mut self, id: AreaId) -> Result<SwapState> {
        let area = self.map.open(id)?;
        state::read_swap_state(area)
    }

    /// Determine the swap operation the bootloader must perform for image
    /// pair `image_index`.
    ///
    /// An unreachable secondary slot counts as empty; any other failure to
    /// obtain a coherent reading yields [`SwapType::Panic`], which callers
    /// should treat as "refuse to swap, boot the primary".
    pub fn swap_type_multi(&mut self, image_index: u8) -> SwapType {
        let primary = match self.hook.primary_state(image_index) {
            Some(Ok(hooked)) => hooked,
            Some(Err(_)) => return SwapType::Panic,
            None => {
                let id = self.map.primary_id(image_index);
                match self.read_swap_state_by_id(id) {
                    Ok(read) => read,
                    Err(_) => return SwapType::Panic,
                }
            }
        };

        let secondary_id = self.map.secondary_id(image_index);
        let secondary = match self.read_swap_state_by_id(secondary_id) {
            Ok(read) => read,
            Err(Error::Flash) => {
                log::info!(
                    "secondary slot of image pair {} unreachable, treating it as empty",
                    image_index
                );
                SwapState::default()
            }
            Err(_) => return SwapType::Panic,
        };

        log::debug!(
            "primary: magic={} swap_type={} copy_done={} image_ok={} image_num={}",
            primary.magic.as_str(),
            primary.swap_type.as_str(),
            primary.copy_done.as_str(),
            primary.image_ok.as_str(),
            primary.image_num
        );
        log::debug!(
            "secondary: magic={} swap_type={} copy_done={} image_ok={} image_num={}",
            secondary.magic.as_str(),
            secondary.swap_type.as_str(),
            secondary.copy_done.as_str(),
            secondary.image_ok.as_str(),
            secondary.image_num
        );

        for rule in &SWAP_RULES {
            if rule.matches(&primary, &secondary) {
                log::info!("swap type: {}", rule.swap_type.as_str());
                // A rule carrying anything else means the table itself is
                // corrupt.
                if !matches!(
                    rule.swap_type,
                    SwapType::Test | SwapType::Perm | SwapType::Revert
                ) {
                    return SwapType::Panic;
                }
                return rule.swap_type;
            }
        }

        log::info!("swap type: none");
        SwapType::None
    }

    /// [`swap_type_multi`](Self::swap_type_multi) for image pair 0.
    pub fn swap_type(&mut self) -> SwapType {
        self.swap_type_multi(0)
    }

    /// Queue the secondary image of pair `image_index` for an update.
    ///
    /// With `permanent` unset the next boot performs a one-time test of the
    /// image, which must then confirm itself or be reverted; with
    /// `permanent` set the image is installed for good. Calling this while
    /// a swap is already scheduled is a no-op.
    ///
    /// The magic is written first: a power loss after only that write
    /// leaves the slot in the state the decision table reads as a test
    /// request, the safest interpretation. Image-ok is written before
    /// swap-info so that a persisted `Perm` always implies image-ok is
    /// present.
    pub fn set_pending_multi(&mut self, image_index: u8, permanent: bool) -> Result<()> {
        let id = self.map.secondary_id(image_index);
        let area = self.map.open(id)?;
        let swap_state = state::read_swap_state(area)?;

        match swap_state.magic {
            // Swap already scheduled.
            Magic::Good => Ok(()),

            Magic::Unset => {
                trailer::write_magic(area)?;
                if permanent {
                    trailer::write_image_ok(area)?;
                }
                let swap_type = if permanent {
                    SwapType::Perm
                } else {
                    SwapType::Test
                };
                trailer::write_swap_info(area, swap_type, 0)
            }

            Magic::Bad => {
                // The slot is corrupt and there is no way to recover its
                // contents. Erase it so future upgrades remain possible.
                log::warn!("slot {} trailer corrupt, erasing slot", id);
                if area.erase(0, area.size()).is_err() {
                    log::warn!("erase of slot {} failed", id);
                }
                Err(Error::BadImage)
            }
        }
    }

    /// [`set_pending_multi`](Self::set_pending_multi) for image pair 0.
    pub fn set_pending(&mut self, permanent: bool) -> Result<()> {
        self.set_pending_multi(0, permanent)
    }

    /// Mark the running primary image of pair `image_index` as accepted,
    /// preventing the next boot from reverting it.
    ///
    /// Confirming an already-confirmed or never-swapped slot is a no-op.
    /// The copy-done flag is deliberately not consulted, so an image
    /// installed through a programming interface can confirm itself too.
    pub fn set_confirmed_multi(&mut self, image_index: u8) -> Result<()> {
        let id = self.map.primary_id(image_index);
        let area = self.map.open(id)?;
        let swap_state = state::read_swap_state(area)?;

        match swap_state.magic {
            // Confirm needed; proceed.
            Magic::Good => {}

            // Nothing was ever staged here; already as confirmed as it gets.
            Magic::Unset => return Ok(()),

            Magic::Bad => return Err(Error::BadVector),
        }

        if swap_state.image_ok != Flag::Unset {
            // Already confirmed.
            return Ok(());
        }

        trailer::write_image_ok(area)
    }

    /// [`set_confirmed_multi`](Self::set_confirmed_multi) for image pair 0.
    pub fn set_confirmed(&mut self) -> Result<()> {
        self.set_confirmed_multi(0)
    }
}
