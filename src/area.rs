// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash-area capability traits.
//!
//! The engine never talks to a flash controller directly. A backend exposes
//! each slot as a [`FlashArea`] (a contiguous, erasable region with its own
//! geometry) and the whole device as a [`FlashMap`] that opens areas by id
//! and resolves which ids belong to an image pair. Any blocking or DMA
//! behind these operations is the backend's concern; from the engine's view
//! they are synchronous.

use crate::Result;

/// Stable identifier of a flash area within a [`FlashMap`].
pub type AreaId = u8;

/// A contiguous, erasable storage region holding one image plus its trailer.
///
/// Slots must reserve at least [`trailer_size`](crate::trailer::trailer_size)
/// bytes at their tail; the trailer offsets are computed from [`size`] and
/// are not range-checked per call.
///
/// [`size`]: FlashArea::size
pub trait FlashArea {
    /// Copy `buf.len()` bytes starting at `off` into `buf`.
    fn read(&self, off: u32, buf: &mut [u8]) -> Result<()>;

    /// Program `buf` at `off`. Both `off` and `buf.len()` must be multiples
    /// of [`align`](FlashArea::align).
    fn write(&mut self, off: u32, buf: &[u8]) -> Result<()>;

    /// Erase `len` bytes starting at `off`; granularity is backend-defined.
    fn erase(&mut self, off: u32, len: u32) -> Result<()>;

    /// Total usable bytes.
    fn size(&self) -> u32;

    /// Absolute device offset of this area, for diagnostics only.
    fn base_off(&self) -> u32;

    /// Stable identifier of this area.
    fn id(&self) -> AreaId;

    /// Minimum write granularity in bytes. `0` is an error sentinel and
    /// makes every trailer write fail with [`Error::Flash`](crate::Error).
    fn align(&self) -> u32;

    /// Byte value that unprogrammed cells read back as (typically `0xff`).
    fn erased_val(&self) -> u8;
}

/// A device's collection of flash areas.
///
/// [`open`](FlashMap::open) hands out a mutable borrow of the area; the end
/// of the borrow is the close, so a slot is released on every control-flow
/// exit, including error paths.
pub trait FlashMap {
    /// Concrete area type handed out by this map.
    type Area: FlashArea;

    /// Borrow the area with the given id. Fails with
    /// [`Error::Flash`](crate::Error) if `id` is unknown or the backend
    /// refuses access.
    fn open(&mut self, id: AreaId) -> Result<&mut Self::Area>;

    /// Id of the primary (boot) slot of image pair `image_index`.
    fn primary_id(&self, image_index: u8) -> AreaId;

    /// Id of the secondary (staging) slot of image pair `image_index`.
    fn secondary_id(&self, image_index: u8) -> AreaId;
}

impl<M: FlashMap + ?Sized> FlashMap for &mut M {
    type Area = M::Area;

    fn open(&mut self, id: AreaId) -> Result<&mut Self::Area> {
        (**self).open(id)
    }

    fn primary_id(&self, image_index: u8) -> AreaId {
        (**self).primary_id(image_index)
    }

    fn secondary_id(&self, image_index: u8) -> AreaId {
        (**self).secondary_id(image_index)
    }
}
