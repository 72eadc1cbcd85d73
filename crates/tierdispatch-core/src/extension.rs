//! CPU instruction-set extensions and capability sets.
//!
//! An [`Extension`] names one capability tier. Tiers carry a fixed priority
//! rank: when several implementations of an operation are usable, the one
//! registered under the highest-ranked extension wins.
//!
//! ```text
//! Rank  Extension  Implies
//! ────  ─────────  ──────────────────────────────
//! 8     NEON       -
//! 7     AVX2       AVX, SSE4.2, SSE4.1, SSSE3, ...
//! 6     AVX        SSE4.2, SSE4.1, SSSE3, SSE3, ...
//! 5     SSE4.2     SSE4.1, SSSE3, SSE3, SSE2, SSE
//! 4     SSE4.1     SSSE3, SSE3, SSE2, SSE
//! 3     SSSE3      SSE3, SSE2, SSE
//! 2     SSE3       SSE2, SSE
//! 1     SSE2       SSE
//! 0     SSE        -
//! ```

use crate::error::{DispatchError, Result};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A CPU instruction-set extension that a kernel tier can require.
///
/// Declaration order is priority order: `Ord` compares ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Extension {
    /// SSE (128-bit single precision)
    Sse,
    /// SSE2 (128-bit double precision and integers)
    Sse2,
    /// SSE3
    Sse3,
    /// Supplemental SSE3
    Ssse3,
    /// SSE4.1
    Sse41,
    /// SSE4.2
    Sse42,
    /// AVX (256-bit floating point)
    Avx,
    /// AVX2 (256-bit integers, broadcasts)
    Avx2,
    /// ARM Advanced SIMD
    Neon,
}

impl Extension {
    /// Every extension, lowest rank first.
    pub const ALL: [Self; 9] = [
        Self::Sse,
        Self::Sse2,
        Self::Sse3,
        Self::Ssse3,
        Self::Sse41,
        Self::Sse42,
        Self::Avx,
        Self::Avx2,
        Self::Neon,
    ];

    /// Priority rank. Higher ranks are preferred.
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sse => "sse",
            Self::Sse2 => "sse2",
            Self::Sse3 => "sse3",
            Self::Ssse3 => "ssse3",
            Self::Sse41 => "sse41",
            Self::Sse42 => "sse42",
            Self::Avx => "avx",
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
        }
    }

    /// Display label, also the default tier label of kernels registered
    /// under this extension.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sse => "SSE",
            Self::Sse2 => "SSE2",
            Self::Sse3 => "SSE3",
            Self::Ssse3 => "SSSE3",
            Self::Sse41 => "SSE41",
            Self::Sse42 => "SSE42",
            Self::Avx => "AVX",
            Self::Avx2 => "AVX2",
            Self::Neon => "NEON",
        }
    }

    /// Extensions whose presence this one implies.
    ///
    /// Hardware does not guarantee the relation; every extension is still
    /// probed on its own.
    pub fn implied(self) -> &'static [Self] {
        match self {
            Self::Sse | Self::Neon => &[],
            Self::Sse2 => &[Self::Sse],
            Self::Sse3 => &[Self::Sse, Self::Sse2],
            Self::Ssse3 => &[Self::Sse, Self::Sse2, Self::Sse3],
            Self::Sse41 => &[Self::Sse, Self::Sse2, Self::Sse3, Self::Ssse3],
            Self::Sse42 => &[Self::Sse, Self::Sse2, Self::Sse3, Self::Ssse3, Self::Sse41],
            Self::Avx => &[
                Self::Sse,
                Self::Sse2,
                Self::Sse3,
                Self::Ssse3,
                Self::Sse41,
                Self::Sse42,
            ],
            Self::Avx2 => &[
                Self::Sse,
                Self::Sse2,
                Self::Sse3,
                Self::Ssse3,
                Self::Sse41,
                Self::Sse42,
                Self::Avx,
            ],
        }
    }

    /// Whether this extension belongs to the x86 family.
    pub const fn is_x86(self) -> bool {
        !matches!(self, Self::Neon)
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Extension {
    type Err = DispatchError;

    /// Parses canonical names as well as the spellings used by compilers
    /// and `/proc/cpuinfo` (`sse4.1`, `sse4_2`, `asimd`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '.' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "sse" => Ok(Self::Sse),
            "sse2" => Ok(Self::Sse2),
            "sse3" | "pni" => Ok(Self::Sse3),
            "ssse3" => Ok(Self::Ssse3),
            "sse41" => Ok(Self::Sse41),
            "sse42" => Ok(Self::Sse42),
            "avx" => Ok(Self::Avx),
            "avx2" => Ok(Self::Avx2),
            "neon" | "asimd" => Ok(Self::Neon),
            _ => Err(DispatchError::unknown_extension(s.trim())),
        }
    }
}

/// A set of extensions, stored as a bitset.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "Vec<Extension>", into = "Vec<Extension>")
)]
pub struct CapabilitySet {
    bits: u16,
}

impl CapabilitySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// The set of every known extension.
    pub fn all() -> Self {
        Extension::ALL.into_iter().collect()
    }

    /// Check membership.
    #[inline]
    pub const fn contains(self, extension: Extension) -> bool {
        self.bits & extension.bit() != 0
    }

    /// Add an extension.
    pub fn insert(&mut self, extension: Extension) {
        self.bits |= extension.bit();
    }

    /// Remove an extension.
    pub fn remove(&mut self, extension: Extension) {
        self.bits &= !extension.bit();
    }

    /// Return a copy with `extension` added.
    #[must_use]
    pub const fn with(self, extension: Extension) -> Self {
        Self {
            bits: self.bits | extension.bit(),
        }
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Extensions in `self` that are not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of extensions in the set.
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate over members, lowest rank first.
    pub fn iter(self) -> impl Iterator<Item = Extension> {
        Extension::ALL.into_iter().filter(move |ext| self.contains(*ext))
    }

    /// The highest-ranked member.
    pub fn best(self) -> Option<Extension> {
        self.iter().last()
    }

    /// Drop every extension whose implied extensions are not all present.
    ///
    /// Members are visited lowest rank first, so a dropped tier also removes
    /// every tier that implies it.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut result = Self::empty();
        for ext in self.iter() {
            if ext.implied().iter().all(|implied| result.contains(*implied)) {
                result.insert(ext);
            }
        }
        result
    }
}

impl FromIterator<Extension> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        let mut set = Self::empty();
        for ext in iter {
            set.insert(ext);
        }
        set
    }
}

impl From<Vec<Extension>> for CapabilitySet {
    fn from(extensions: Vec<Extension>) -> Self {
        extensions.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Extension> {
    fn from(set: CapabilitySet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let labels: Vec<&str> = self.iter().map(Extension::label).collect();
        f.write_str(&labels.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rank_follows_declaration_order() {
        for pair in Extension::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
            assert!(pair[0] < pair[1]);
        }
        assert!(Extension::Neon > Extension::Avx2);
        assert!(Extension::Avx2 > Extension::Sse42);
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!("sse4.1".parse::<Extension>().unwrap(), Extension::Sse41);
        assert_eq!("SSE4_2".parse::<Extension>().unwrap(), Extension::Sse42);
        assert_eq!(" avx2 ".parse::<Extension>().unwrap(), Extension::Avx2);
        assert_eq!("asimd".parse::<Extension>().unwrap(), Extension::Neon);

        let err = "mmx".parse::<Extension>().unwrap_err();
        assert_eq!(err, DispatchError::unknown_extension("mmx"));
    }

    #[test]
    fn test_name_round_trips() {
        for ext in Extension::ALL {
            assert_eq!(ext.name().parse::<Extension>().unwrap(), ext);
            assert_eq!(ext.label().parse::<Extension>().unwrap(), ext);
        }
    }

    #[test]
    fn test_implied_are_lower_ranked() {
        for ext in Extension::ALL {
            for implied in ext.implied() {
                assert!(implied < &ext, "{ext} implies higher tier {implied}");
                assert!(implied.is_x86());
            }
        }
        assert_eq!(
            Extension::Ssse3.implied(),
            &[Extension::Sse, Extension::Sse2, Extension::Sse3]
        );
    }

    #[test]
    fn test_set_operations() {
        let mut set = CapabilitySet::empty();
        assert!(set.is_empty());
        set.insert(Extension::Avx);
        set.insert(Extension::Sse2);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Extension::Avx));
        assert!(!set.contains(Extension::Avx2));
        assert_eq!(set.best(), Some(Extension::Avx));

        set.remove(Extension::Avx);
        assert_eq!(set.best(), Some(Extension::Sse2));

        let other = CapabilitySet::empty().with(Extension::Neon);
        assert_eq!(set.union(other).len(), 2);
        assert_eq!(set.union(other).difference(set), other);
        assert_eq!(CapabilitySet::all().len(), Extension::ALL.len());
    }

    #[test]
    fn test_normalized_drops_unsupported_chain() {
        // AVX2 without SSE4.2 underneath is not trusted, nor is anything above it.
        let raw: CapabilitySet = [
            Extension::Sse,
            Extension::Sse2,
            Extension::Sse3,
            Extension::Ssse3,
            Extension::Sse41,
            Extension::Avx,
            Extension::Avx2,
            Extension::Neon,
        ]
        .into_iter()
        .collect();

        let normalized = raw.normalized();
        let expected: CapabilitySet = [
            Extension::Sse,
            Extension::Sse2,
            Extension::Sse3,
            Extension::Ssse3,
            Extension::Sse41,
            Extension::Neon,
        ]
        .into_iter()
        .collect();
        assert_eq!(normalized, expected);
        assert_eq!(CapabilitySet::all().normalized(), CapabilitySet::all());
    }

    #[test]
    fn test_display() {
        assert_eq!(CapabilitySet::empty().to_string(), "none");
        let set = CapabilitySet::empty().with(Extension::Sse2).with(Extension::Avx);
        assert_eq!(set.to_string(), "SSE2 AVX");
        assert_eq!(format!("{set:?}"), "{Sse2, Avx}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_name_list() {
        let set = CapabilitySet::empty().with(Extension::Sse41).with(Extension::Neon);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["sse41","neon"]"#);
        let back: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
