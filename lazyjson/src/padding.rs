// SPDX-License-Identifier: Apache-2.0

//! Padding requirement, page-boundary check and the process-wide zero-copy toggle.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Bytes the engine may read past the logical end of its input.
pub const PADDING: usize = 64;

static ZERO_COPY: AtomicBool = AtomicBool::new(cfg!(feature = "zero-copy"));

/// Enable or disable reuse of caller buffers as parser input.
///
/// The setting is process-wide and applies to the next buffer preparation;
/// views that already exist keep whatever backing they were built with.
pub fn set_zero_copy(enabled: bool) {
    log::debug!("padding: zero-copy parsing {}", if enabled { "enabled" } else { "disabled" });
    ZERO_COPY.store(enabled, Ordering::Relaxed);
}

/// Whether buffer preparation currently tries the in-place strategy first.
pub fn zero_copy_enabled() -> bool {
    ZERO_COPY.load(Ordering::Relaxed)
}

/// Smallest virtual memory page size for this target: 16 KiB on Apple
/// silicon, 4 KiB elsewhere.
///
/// This is a lower bound, not a query of the running system. Larger pages only
/// put boundaries at multiples of it, so the boundary check in
/// [`need_allocation`] stays conservative on any host.
pub const fn page_size() -> usize {
    if cfg!(all(target_vendor = "apple", target_arch = "aarch64")) {
        16384
    } else {
        4096
    }
}

/// `len + PADDING`, or [`Error::InputTooLarge`] when that would overflow.
pub fn padded_len(len: usize) -> Result<usize> {
    len.checked_add(PADDING)
        .ok_or(Error::InputTooLarge { len })
}

/// Returns true when the bytes at `addr..addr + len` cannot be over-read by
/// [`PADDING`] bytes without risking a fault, so a padded copy is required.
///
/// The tail is safe when it sits far enough from the next page boundary, or
/// when the allocation already owns `PADDING` spare bytes past the content.
pub fn need_allocation(addr: usize, len: usize, capacity: usize) -> bool {
    if cfg!(feature = "always-copy") {
        return true;
    }
    let end = addr.wrapping_add(len).wrapping_sub(1);
    let offset = end % page_size();
    if offset + PADDING < page_size() {
        return false;
    }
    match len.checked_add(PADDING) {
        Some(required) => capacity < required,
        None => true,
    }
}
