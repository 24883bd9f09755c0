// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Decoded trailer state.
//!
//! [`read_swap_state`] turns the raw trailer bytes of one slot into a
//! [`SwapState`] snapshot: semantic values for the magic and the two flags,
//! plus the swap type and image number unpacked from the swap-info byte.
//! The snapshot is a plain value; nothing is cached between reads.

use crate::area::FlashArea;
use crate::trailer::{self, FLAG_SET, MAGIC, MAGIC_SZ};
use crate::Result;

/// Semantic value of a slot's magic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Magic {
    /// The bytes equal the magic constant.
    Good,
    /// The bytes read back as erased.
    Unset,
    /// Anything else.
    Bad,
}

impl Magic {
    /// Short name, for diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Unset => "unset",
            Self::Bad => "bad",
        }
    }
}

/// Semantic value of a one-byte trailer flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Flag {
    /// The programmed-set byte value.
    Set,
    /// The erased value.
    Unset,
    /// Anything else.
    Bad,
}

impl Flag {
    pub(crate) fn decode(raw: u8, erased: u8) -> Self {
        if raw == erased {
            Self::Unset
        } else if raw == FLAG_SET {
            Self::Set
        } else {
            Self::Bad
        }
    }

    /// Short name, for diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Unset => "unset",
            Self::Bad => "bad",
        }
    }
}

/// The swap operation requested of, or concluded by, the bootloader.
///
/// Only `None` through `Revert` are ever persisted in a trailer. `Fail` and
/// `Panic` exist for the engine and the bootloader's swap loop and never
/// reach flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SwapType {
    /// No action required.
    None = 0,
    /// Boot the staged image once; revert unless it confirms itself.
    Test = 1,
    /// Install the staged image permanently.
    Perm = 2,
    /// Swap back to the previous image.
    Revert = 3,
    /// A swap was attempted and failed.
    Fail = 4,
    /// The engine could not obtain a coherent reading of a slot.
    Panic = 0xff,
}

impl SwapType {
    /// Short name, for diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Test => "test",
            Self::Perm => "perm",
            Self::Revert => "revert",
            Self::Fail => "fail",
            Self::Panic => "panic",
        }
    }
}

/// Pack a swap type and image number into a swap-info byte.
pub(crate) fn pack_swap_info(swap_type: SwapType, image_num: u8) -> u8 {
    ((image_num & 0x0f) << 4) | (swap_type as u8 & 0x0f)
}

/// Unpack a swap-info byte. An erased byte or an unknown swap type
/// normalises to `(None, 0)`.
pub(crate) fn unpack_swap_info(info: u8, erased: u8) -> (SwapType, u8) {
    let raw_type = info & 0x0f;
    if info == erased || raw_type > SwapType::Revert as u8 {
        return (SwapType::None, 0);
    }
    let swap_type = match raw_type {
        1 => SwapType::Test,
        2 => SwapType::Perm,
        3 => SwapType::Revert,
        _ => SwapType::None,
    };
    (swap_type, info >> 4)
}

/// Decoded snapshot of one slot's trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub struct SwapState {
    pub magic: Magic,
    pub swap_type: SwapType,
    pub copy_done: Flag,
    pub image_ok: Flag,
    pub image_num: u8,
}

impl Default for SwapState {
    /// The canonical state of a freshly erased slot.
    fn default() -> Self {
        Self {
            magic: Magic::Unset,
            swap_type: SwapType::None,
            copy_done: Flag::Unset,
            image_ok: Flag::Unset,
            image_num: 0,
        }
    }
}

/// Decode the trailer of one slot.
///
/// Any underlying read error aborts the decode; a partially populated state
/// is never returned.
pub fn read_swap_state<A: FlashArea + ?Sized>(area: &A) -> Result<SwapState> {
    let mut magic = [0u8; MAGIC_SZ];
    area.read(trailer::magic_off(area), &mut magic)?;
    let magic = if trailer::buffer_is_erased(area, &magic) {
        Magic::Unset
    } else if magic == MAGIC {
        Magic::Good
    } else {
        Magic::Bad
    };

    let mut info = [0u8; 1];
    area.read(trailer::swap_info_off(area), &mut info)?;
    let (swap_type, image_num) = unpack_swap_info(info[0], area.erased_val());

    let copy_done = trailer::read_copy_done(area)?;
    let image_ok = trailer::read_image_ok(area)?;

    Ok(SwapState {
        magic,
        swap_type,
        copy_done,
        image_ok,
        image_num,
    })
}
