//! SIMD detection and dispatch for CPU kernels
//!
//! Each operation family has its own submodule whose `mod.rs` performs the
//! architecture dispatch:
//!
//! ```text
//! simd/
//! ├── mod.rs              # This file: detection only
//! ├── binary/             # add, sub, mul, div (exact IEEE ops only)
//! ├── unary/              # sqrt
//! └── reduce/             # horizontal sum
//! ```
//!
//! | Architecture | Instruction Set | Vector Width | Status    |
//! |--------------|-----------------|--------------|-----------|
//! | x86-64       | AVX-512F        | 512 bits     | Supported |
//! | x86-64       | AVX2 + FMA      | 256 bits     | Supported |
//! | ARM64        | NEON            | 128 bits     | Supported |
//! | Any          | Scalar          | N/A          | Fallback  |
//!
//! Elementwise vector kernels only exist for operations whose vector form
//! rounds exactly like the scalar form, so elementwise results never depend on
//! the detected level. Sums reassociate and may differ in the last bits.

pub mod binary;
pub mod reduce;
pub mod unary;

use std::sync::OnceLock;

/// SIMD capability level detected at runtime
///
/// Variants for other architectures exist everywhere but are only
/// constructed on their own platform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[allow(dead_code)]
pub enum SimdLevel {
    /// AVX-512F (16 f32s or 8 f64s)
    Avx512 = 3,
    /// AVX2 with FMA (8 f32s or 4 f64s)
    Avx2Fma = 2,
    /// NEON baseline for AArch64 (4 f32s or 2 f64s)
    Neon = 1,
    /// Scalar fallback (no SIMD)
    Scalar = 0,
}

impl SimdLevel {
    /// Returns the name of this SIMD level as a string
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avx512 => "AVX-512",
            Self::Avx2Fma => "AVX2+FMA",
            Self::Neon => "NEON",
            Self::Scalar => "Scalar",
        }
    }
}

impl std::fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached SIMD level detection
static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Detect the best available SIMD level for the current CPU
///
/// The first call performs detection; later calls return the cached level.
#[inline]
pub fn detect_simd() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(detect_simd_uncached)
}

#[cold]
fn detect_simd_uncached() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx512f") {
            return SimdLevel::Avx512;
        }
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return SimdLevel::Avx2Fma;
        }
        SimdLevel::Scalar
    }

    // NEON is mandatory for AArch64
    #[cfg(target_arch = "aarch64")]
    {
        SimdLevel::Neon
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SimdLevel::Scalar
    }
}
