// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Trailer field layout and single-block codec.
//!
//! Every slot ends in a fixed-layout trailer, from high address down:
//! the 16-byte magic, then one [`MAX_ALIGN`]-sized block each for the
//! image-ok, copy-done and swap-info fields. Each field owns a whole
//! aligned block so that programming one field never re-programs cells of
//! another; many flash parts forbid a second program within an
//! already-written write unit. Unused bytes of a block are filled with the
//! area's erased value, which keeps later single-field programs legal.

use crate::area::FlashArea;
use crate::log;
use crate::state::{self, Flag, SwapType};
use crate::{Error, Result};

/// Worst-case write granularity across supported flash parts. Trailer
/// layout pads every field below the magic to this size; the *actual*
/// alignment of an area only governs the length of individual writes.
pub const MAX_ALIGN: usize = 8;

/// Byte programmed into a flag block to mark the flag as set.
pub const FLAG_SET: u8 = 0x01;

/// Number of magic bytes at the tail of a slot.
pub const MAGIC_SZ: usize = 16;

/// Trailer magic: four 32-bit words, little-endian on flash. Presence of
/// this exact byte sequence means an intent was written to the slot.
pub const MAGIC: [u8; MAGIC_SZ] = [
    0x77, 0xc2, 0x95, 0xf3, // 0xf395c277
    0x60, 0xd2, 0xef, 0x7f, // 0x7fefd260
    0x35, 0x52, 0x50, 0x0f, // 0x0f505235
    0x2c, 0xb6, 0x79, 0x80, // 0x8079b62c
];

/// Bytes a slot must reserve at its tail for the trailer.
#[must_use]
pub const fn trailer_size() -> u32 {
    (MAGIC_SZ + 3 * MAX_ALIGN) as u32
}

/// Offset of the magic field: the last [`MAGIC_SZ`] bytes of the slot.
pub fn magic_off<A: FlashArea + ?Sized>(area: &A) -> u32 {
    area.size() - MAGIC_SZ as u32
}

/// Offset of the image-ok flag block, one aligned block below the magic.
pub fn image_ok_off<A: FlashArea + ?Sized>(area: &A) -> u32 {
    magic_off(area) - MAX_ALIGN as u32
}

/// Offset of the copy-done flag block.
pub fn copy_done_off<A: FlashArea + ?Sized>(area: &A) -> u32 {
    image_ok_off(area) - MAX_ALIGN as u32
}

/// Offset of the swap-info block.
pub fn swap_info_off<A: FlashArea + ?Sized>(area: &A) -> u32 {
    copy_done_off(area) - MAX_ALIGN as u32
}

/// True iff `buf` is non-empty and every byte equals `fill`.
#[must_use]
pub fn buffer_is_filled(buf: &[u8], fill: u8) -> bool {
    !buf.is_empty() && buf.iter().all(|&b| b == fill)
}

/// True iff `buf` is non-empty and reads back as erased for `area`.
pub fn buffer_is_erased<A: FlashArea + ?Sized>(area: &A, buf: &[u8]) -> bool {
    buffer_is_filled(buf, area.erased_val())
}

/// Program the magic constant at the tail of the slot.
pub fn write_magic<A: FlashArea + ?Sized>(area: &mut A) -> Result<()> {
    let off = magic_off(area);
    log::debug!("writing magic; area={} off={}", area.id(), off);
    area.write(off, &MAGIC)
}

/// Program one trailer field.
///
/// `payload` is padded with the erased value up to the area's actual write
/// alignment and written as a single block at `off`. Fails with
/// [`Error::Invalid`] if the padded length exceeds [`MAX_ALIGN`] and with
/// [`Error::Flash`] if the area reports an alignment of zero.
pub fn write_trailer<A: FlashArea + ?Sized>(area: &mut A, off: u32, payload: &[u8]) -> Result<()> {
    let align = area.align() as usize;
    if align == 0 {
        return Err(Error::Flash);
    }
    let len = payload.len().next_multiple_of(align);
    if len > MAX_ALIGN {
        return Err(Error::Invalid);
    }

    let mut block = [0u8; MAX_ALIGN];
    block[..payload.len()].copy_from_slice(payload);
    block[payload.len()..len].fill(area.erased_val());

    area.write(off, &block[..len])
}

/// Program a one-byte flag field at `off`.
pub fn write_flag<A: FlashArea + ?Sized>(area: &mut A, off: u32, value: u8) -> Result<()> {
    write_trailer(area, off, &[value])
}

/// Mark the image in this slot as confirmed by the running firmware.
pub fn write_image_ok<A: FlashArea + ?Sized>(area: &mut A) -> Result<()> {
    let off = image_ok_off(area);
    log::debug!("writing image_ok; area={} off={}", area.id(), off);
    write_flag(area, off, FLAG_SET)
}

/// Persist the requested swap operation so the bootloader can resume it
/// after an unexpected reset.
pub fn write_swap_info<A: FlashArea + ?Sized>(
    area: &mut A,
    swap_type: SwapType,
    image_num: u8,
) -> Result<()> {
    let info = state::pack_swap_info(swap_type, image_num);
    let off = swap_info_off(area);
    log::debug!(
        "writing swap_info; area={} off={} swap_type={} image_num={}",
        area.id(),
        off,
        swap_type.as_str(),
        image_num
    );
    write_flag(area, off, info)
}

/// Read and decode a one-byte flag field at `off`.
pub fn read_flag<A: FlashArea + ?Sized>(area: &A, off: u32) -> Result<Flag> {
    let mut raw = [0u8; 1];
    area.read(off, &mut raw)?;
    Ok(Flag::decode(raw[0], area.erased_val()))
}

/// Read the image-ok flag.
pub fn read_image_ok<A: FlashArea + ?Sized>(area: &A) -> Result<Flag> {
    read_flag(area, image_ok_off(area))
}

/// Read the copy-done flag.
pub fn read_copy_done<A: FlashArea + ?Sized>(area: &A) -> Result<Flag> {
    read_flag(area, copy_done_off(area))
}
