// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Simulated flash for host-side tests and tooling.
//!
//! Models the strict end of NOR behaviour so that engine bugs surface on a
//! workstation instead of a device: program operations must be aligned and
//! may only clear bits, erases restore whole regions to the erased value.
//! Contract violations panic, because they are bugs in the caller; injected
//! faults (see [`SimArea::limit_writes`]) return [`Error::Flash`] like a
//! real backend would.

use std::collections::BTreeMap;

use crate::area::{AreaId, FlashArea, FlashMap};
use crate::{Error, Result};

/// Default write alignment of simulated areas.
pub const SIM_ALIGN: u32 = 8;

/// Default erased byte of simulated areas.
pub const SIM_ERASED: u8 = 0xff;

/// A sparse collection of simulated areas.
///
/// Image pair `n` resolves to primary id `2n + 1` and secondary id
/// `2n + 2`; an id with no registered area behaves as an unreachable slot.
#[derive(Debug, Default)]
pub struct SimFlash {
    areas: BTreeMap<AreaId, SimArea>,
}

impl SimFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an erased area with the default alignment and erased value.
    pub fn add_area(&mut self, id: AreaId, size: u32) {
        self.add_area_with(id, size, SIM_ALIGN, SIM_ERASED);
    }

    /// Register an erased area with explicit geometry.
    pub fn add_area_with(&mut self, id: AreaId, size: u32, align: u32, erased: u8) {
        let base = self.areas.values().map(|a| a.data.len() as u32).sum();
        self.areas.insert(
            id,
            SimArea {
                id,
                base,
                align,
                erased,
                data: vec![erased; size as usize],
                write_budget: None,
            },
        );
    }

    /// Borrow a registered area for inspection. Panics on an unknown id.
    pub fn area(&self, id: AreaId) -> &SimArea {
        self.areas.get(&id).expect("unknown simulated area")
    }

    /// Mutably borrow a registered area. Panics on an unknown id.
    pub fn area_mut(&mut self, id: AreaId) -> &mut SimArea {
        self.areas.get_mut(&id).expect("unknown simulated area")
    }
}

impl FlashMap for SimFlash {
    type Area = SimArea;

    fn open(&mut self, id: AreaId) -> Result<&mut SimArea> {
        self.areas.get_mut(&id).ok_or(Error::Flash)
    }

    fn primary_id(&self, image_index: u8) -> AreaId {
        2 * image_index + 1
    }

    fn secondary_id(&self, image_index: u8) -> AreaId {
        2 * image_index + 2
    }
}

/// One simulated slot.
#[derive(Debug)]
pub struct SimArea {
    id: AreaId,
    base: u32,
    align: u32,
    erased: u8,
    data: Vec<u8>,
    write_budget: Option<u32>,
}

impl SimArea {
    /// Raw backing bytes, for byte-level assertions.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Let `n` more writes succeed; every later write fails with
    /// [`Error::Flash`] without touching the store. Reads and erases are
    /// unaffected. Models power loss partway through a write sequence.
    pub fn limit_writes(&mut self, n: u32) {
        self.write_budget = Some(n);
    }
}

impl FlashArea for SimArea {
    fn read(&self, off: u32, buf: &mut [u8]) -> Result<()> {
        let off = off as usize;
        assert!(
            off + buf.len() <= self.data.len(),
            "read past end of area {}",
            self.id
        );
        buf.copy_from_slice(&self.data[off..off + buf.len()]);
        Ok(())
    }

    fn write(&mut self, off: u32, buf: &[u8]) -> Result<()> {
        assert_eq!(
            off % self.align,
            0,
            "unaligned write offset {off} in area {}",
            self.id
        );
        assert_eq!(
            buf.len() as u32 % self.align,
            0,
            "unaligned write length {} in area {}",
            buf.len(),
            self.id
        );
        let off = off as usize;
        assert!(
            off + buf.len() <= self.data.len(),
            "write past end of area {}",
            self.id
        );

        if let Some(budget) = &mut self.write_budget {
            if *budget == 0 {
                return Err(Error::Flash);
            }
            *budget -= 1;
        }

        for (i, (cell, &new)) in self.data[off..off + buf.len()].iter_mut().zip(buf).enumerate() {
            if self.erased == 0xff {
                // NOR programming can only clear bits.
                assert_eq!(
                    *cell & new,
                    new,
                    "program would set bits at offset {} of area {}",
                    off + i,
                    self.id
                );
                *cell &= new;
            } else {
                *cell = new;
            }
        }
        Ok(())
    }

    fn erase(&mut self, off: u32, len: u32) -> Result<()> {
        let off = off as usize;
        let len = len as usize;
        assert!(
            off + len <= self.data.len(),
            "erase past end of area {}",
            self.id
        );
        self.data[off..off + len].fill(self.erased);
        Ok(())
    }

    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn base_off(&self) -> u32 {
        self.base
    }

    fn id(&self) -> AreaId {
        self.id
    }

    fn align(&self) -> u32 {
        self.align
    }

    fn erased_val(&self) -> u8 {
        self.erased
    }
}
