// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Representation flags and the per-tree mutation clock.

use std::fmt;
use std::ops::BitOr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Which forms of a constructed value are currently populated.
///
/// At least one flag is always set. When both `ENCODED` and `COMPONENTS`
/// are set they denote the same logical value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Representation(u8);

impl Representation {
    /// Defaults derivable from the type alone.
    pub const TYPE_ONLY: Self = Self(0b001);
    /// An encoded snapshot is held.
    pub const ENCODED: Self = Self(0b010);
    /// Decoded component values are held.
    pub const COMPONENTS: Self = Self(0b100);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for Representation {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::TYPE_ONLY, "TYPE_ONLY"),
            (Self::ENCODED, "ENCODED"),
            (Self::COMPONENTS, "COMPONENTS"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("EMPTY")?;
        }
        Ok(())
    }
}

/// Counter shared by a root value and all of its components.
///
/// Every logical mutation anywhere in the tree advances it. An encoded
/// snapshot held next to live components is only valid at the tick it was
/// taken.
#[derive(Debug, Clone, Default)]
pub(crate) struct MutationClock(Arc<AtomicU64>);

impl MutationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}
