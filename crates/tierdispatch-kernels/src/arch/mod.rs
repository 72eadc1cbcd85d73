//! Architecture-specific kernel bodies and the guard that protects them.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod x86;

#[cfg(target_arch = "aarch64")]
pub(crate) mod aarch64;

use tierdispatch_core::{host_capabilities, Extension};

/// Whether the host itself supports `extension`.
///
/// Tier wrappers consult this rather than the dispatcher's probe, so a
/// simulated probe can select a tier the host lacks without executing an
/// unsupported instruction: the wrapper then runs the fallback instead.
#[inline]
#[allow(dead_code)]
pub(crate) fn host_supports(extension: Extension) -> bool {
    host_capabilities().contains(extension)
}

/// Define a safe tier wrapper around an `unsafe` target-feature kernel.
macro_rules! guarded_kernel {
    (
        $(#[$doc:meta])*
        pub fn $name:ident($arg:ident: $ty:ty);
        requires $ext:ident on ($($arch:tt),+) => $imp:path;
        otherwise $fallback:path;
    ) => {
        $(#[$doc])*
        pub fn $name($arg: $ty) {
            #[cfg(any($(target_arch = $arch),+))]
            {
                if $crate::arch::host_supports(tierdispatch_core::Extension::$ext) {
                    // SAFETY: the host reports the extension this body is compiled for.
                    unsafe { $imp($arg) };
                    return;
                }
            }
            $fallback($arg);
        }
    };
}

pub(crate) use guarded_kernel;
