// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the trailer layout and field codec.

use seesaw_boot::sim::SimFlash;
use seesaw_boot::trailer::{self, FLAG_SET, MAGIC};
use seesaw_boot::{Error, Flag, FlashArea, Magic, SwapState, SwapType, read_swap_state};

// --- Layout tests ---

#[test]
fn test_trailer_size() {
    // 16 magic bytes plus three 8-byte field blocks.
    assert_eq!(trailer::trailer_size(), 40);
}

#[test]
fn test_magic_constant_words() {
    // The magic is the little-endian encoding of four fixed 32-bit words.
    let words = [0xf395_c277u32, 0x7fef_d260, 0x0f50_5235, 0x8079_b62c];
    let mut bytes = [0u8; 16];
    for (chunk, word) in bytes.chunks_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    assert_eq!(bytes, MAGIC);
}

#[test]
fn test_field_offsets_for_4k_slot() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let area = flash.area(1);
    assert_eq!(trailer::magic_off(area), 4080);
    assert_eq!(trailer::image_ok_off(area), 4072);
    assert_eq!(trailer::copy_done_off(area), 4064);
    assert_eq!(trailer::swap_info_off(area), 4056);
}

#[test]
fn test_field_offsets_strictly_decreasing() {
    let mut flash = SimFlash::new();
    for (id, size) in [(1u8, 40u32), (2, 64), (3, 256), (4, 4096), (5, 0x2_0000)] {
        flash.add_area(id, size);
        let area = flash.area(id);

        let magic = trailer::magic_off(area);
        let image_ok = trailer::image_ok_off(area);
        let copy_done = trailer::copy_done_off(area);
        let swap_info = trailer::swap_info_off(area);

        assert_eq!(magic, size - 16);
        assert!(magic > image_ok, "size {size}");
        assert!(image_ok > copy_done, "size {size}");
        assert!(copy_done > swap_info, "size {size}");
        assert_eq!(magic - image_ok, 8);
        assert_eq!(image_ok - copy_done, 8);
        assert_eq!(copy_done - swap_info, 8);
    }
}

#[test]
fn test_minimal_slot_trailer_fits_exactly() {
    let mut flash = SimFlash::new();
    flash.add_area(1, trailer::trailer_size());

    // The swap-info block lands at the start of the slot.
    assert_eq!(trailer::swap_info_off(flash.area(1)), 0);
}

// --- Buffer helper tests ---

#[test]
fn test_buffer_is_filled() {
    assert!(trailer::buffer_is_filled(&[0xff; 4], 0xff));
    assert!(trailer::buffer_is_filled(&[0x00; 4], 0x00));
    assert!(!trailer::buffer_is_filled(&[0xff, 0xff, 0x7f, 0xff], 0xff));
}

#[test]
fn test_buffer_is_filled_empty_is_false() {
    assert!(!trailer::buffer_is_filled(&[], 0xff));
}

#[test]
fn test_buffer_is_erased_uses_area_erased_value() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 64);
    flash.add_area_with(2, 64, 8, 0x00);

    assert!(trailer::buffer_is_erased(flash.area(1), &[0xff; 8]));
    assert!(!trailer::buffer_is_erased(flash.area(1), &[0x00; 8]));
    assert!(trailer::buffer_is_erased(flash.area(2), &[0x00; 8]));
}

// --- Write path tests ---

#[test]
fn test_write_magic_places_constant_at_tail() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    trailer::write_magic(flash.area_mut(1)).unwrap();

    let bytes = flash.area(1).bytes();
    assert_eq!(&bytes[4080..4096], &MAGIC);
    // Nothing below the magic was touched.
    assert!(bytes[..4080].iter().all(|&b| b == 0xff));
}

#[test]
fn test_write_flag_pads_block_with_erased_value() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let area = flash.area_mut(1);
    let off = trailer::image_ok_off(area);
    trailer::write_flag(area, off, FLAG_SET).unwrap();

    let bytes = flash.area(1).bytes();
    assert_eq!(bytes[4072], FLAG_SET);
    assert!(bytes[4073..4080].iter().all(|&b| b == 0xff));
}

#[test]
fn test_write_trailer_uses_actual_alignment() {
    // On a byte-writable part the payload is not padded up to the layout
    // alignment.
    let mut flash = SimFlash::new();
    flash.add_area_with(1, 64, 1, 0xff);

    trailer::write_trailer(flash.area_mut(1), 0, &[0xab, 0xcd, 0xef]).unwrap();

    let bytes = flash.area(1).bytes();
    assert_eq!(&bytes[..3], &[0xab, 0xcd, 0xef]);
    assert_eq!(bytes[3], 0xff);
}

#[test]
fn test_write_trailer_rejects_oversized_payload() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 64);

    let err = trailer::write_trailer(flash.area_mut(1), 0, &[0u8; 9]);
    assert_eq!(err, Err(Error::Invalid));
}

#[test]
fn test_write_trailer_rejects_alignment_above_layout_max() {
    // A part whose write unit exceeds the layout alignment cannot hold this
    // trailer; even a one-byte field write must be refused.
    let mut flash = SimFlash::new();
    flash.add_area_with(1, 64, 16, 0xff);

    let err = trailer::write_trailer(flash.area_mut(1), 0, &[FLAG_SET]);
    assert_eq!(err, Err(Error::Invalid));
}

#[test]
fn test_write_trailer_rejects_zero_alignment() {
    let mut flash = SimFlash::new();
    flash.add_area_with(1, 64, 0, 0xff);

    let err = trailer::write_trailer(flash.area_mut(1), 0, &[FLAG_SET]);
    assert_eq!(err, Err(Error::Flash));
}

// --- Flag decode tests ---

#[test]
fn test_read_flag_decodes_all_byte_values() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 64);

    for raw in 0..=255u8 {
        let area = flash.area_mut(1);
        area.erase(0, 64).unwrap();

        let off = trailer::copy_done_off(area);
        area.write(off, &[raw, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
            .unwrap();

        let expected = match raw {
            0xff => Flag::Unset,
            FLAG_SET => Flag::Set,
            _ => Flag::Bad,
        };
        assert_eq!(
            trailer::read_flag(area, off).unwrap(),
            expected,
            "raw flag byte {raw:#04x}"
        );
    }
}

#[test]
fn test_read_image_ok_and_copy_done_use_their_own_blocks() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let area = flash.area_mut(1);
    trailer::write_image_ok(area).unwrap();

    assert_eq!(trailer::read_image_ok(area).unwrap(), Flag::Set);
    assert_eq!(trailer::read_copy_done(area).unwrap(), Flag::Unset);
}

// --- Swap-info tests ---

#[test]
fn test_swap_info_round_trip() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let persisted = [SwapType::None, SwapType::Test, SwapType::Perm, SwapType::Revert];
    for swap_type in persisted {
        for image_num in 0..=15u8 {
            let area = flash.area_mut(1);
            area.erase(0, 4096).unwrap();

            trailer::write_swap_info(area, swap_type, image_num).unwrap();
            let state = read_swap_state(area).unwrap();

            assert_eq!(state.swap_type, swap_type, "type {swap_type:?} num {image_num}");
            assert_eq!(state.image_num, image_num, "type {swap_type:?} num {image_num}");
        }
    }
}

#[test]
fn test_swap_info_unknown_type_normalises_to_none() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let area = flash.area_mut(1);
    let off = trailer::swap_info_off(area);
    // Image number 4, swap type 7: the type is outside the persisted range.
    trailer::write_flag(area, off, 0x47).unwrap();

    let state = read_swap_state(area).unwrap();
    assert_eq!(state.swap_type, SwapType::None);
    assert_eq!(state.image_num, 0);
}

// --- Full decode tests ---

#[test]
fn test_erased_slot_decodes_to_canonical_state() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let state = read_swap_state(flash.area(1)).unwrap();
    assert_eq!(state, SwapState::default());
    assert_eq!(state.magic, Magic::Unset);
    assert_eq!(state.swap_type, SwapType::None);
    assert_eq!(state.copy_done, Flag::Unset);
    assert_eq!(state.image_ok, Flag::Unset);
    assert_eq!(state.image_num, 0);
}

#[test]
fn test_written_magic_decodes_good() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    trailer::write_magic(flash.area_mut(1)).unwrap();
    assert_eq!(read_swap_state(flash.area(1)).unwrap().magic, Magic::Good);
}

#[test]
fn test_partial_magic_decodes_bad() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    // Only half the constant made it to flash.
    let area = flash.area_mut(1);
    let off = trailer::magic_off(area);
    area.write(off, &MAGIC[..8]).unwrap();

    assert_eq!(read_swap_state(area).unwrap().magic, Magic::Bad);
}

#[test]
fn test_zeroed_magic_decodes_bad() {
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    let area = flash.area_mut(1);
    let off = trailer::magic_off(area);
    area.write(off, &[0u8; 16]).unwrap();

    assert_eq!(read_swap_state(area).unwrap().magic, Magic::Bad);
}

#[test]
fn test_decode_is_total_over_trailer_bytes() {
    // Whatever bytes the trailer holds, every decoded field stays inside
    // its declared value space.
    let mut flash = SimFlash::new();
    flash.add_area(1, 4096);

    for seed in [0x00u8, 0x01, 0x02, 0x7f, 0xa5, 0xfe] {
        let area = flash.area_mut(1);
        area.erase(0, 4096).unwrap();

        let off = trailer::swap_info_off(area);
        let mut block = [0u8; 24];
        for (i, b) in block.iter_mut().enumerate() {
            *b = seed.wrapping_add(i as u8);
        }
        area.write(off, &block).unwrap();

        let state = read_swap_state(area).unwrap();
        assert!(state.swap_type as u8 <= SwapType::Revert as u8);
        assert!(state.image_num <= 15);
        assert!(matches!(state.image_ok, Flag::Set | Flag::Unset | Flag::Bad));
        assert!(matches!(state.copy_done, Flag::Set | Flag::Unset | Flag::Bad));
    }
}
