// SPDX-License-Identifier: Apache-2.0

//! Compile-time configuration validation
//!
//! Buffer strategy features are mutually exclusive: `always-copy` forces every
//! input through the copy/grow path, which contradicts starting with zero-copy
//! enabled.

#[cfg(all(feature = "zero-copy", feature = "always-copy"))]
compile_error!(
    "Cannot enable both 'zero-copy' and 'always-copy' features simultaneously: disable default features to use 'always-copy'"
);
