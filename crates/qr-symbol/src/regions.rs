//! Location of the structural regions a shape transform must not distort.

use serde::Serialize;
use tracing::debug;

use crate::matrix::SymbolMatrix;
use crate::{FINDER_SIDE, Result, SymbolError};

/// Names of the protected structural regions of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionName {
    FinderTl,
    FinderTr,
    FinderBl,
    TimingRow,
    TimingCol,
    FormatInfo,
    VersionInfo,
}

impl std::fmt::Display for RegionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RegionName::FinderTl => "finder-TL",
            RegionName::FinderTr => "finder-TR",
            RegionName::FinderBl => "finder-BL",
            RegionName::TimingRow => "timing-row",
            RegionName::TimingCol => "timing-col",
            RegionName::FormatInfo => "format-info",
            RegionName::VersionInfo => "version-info",
        };
        f.write_str(s)
    }
}

/// An axis-aligned rectangle in module coordinates (quiet zone excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl ModuleRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// One past the rightmost module column.
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// One past the bottommost module row.
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

/// A named region of the symbol that must survive the transform intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtectedRegion {
    pub name: RegionName,
    pub bounds: ModuleRect,
}

impl ProtectedRegion {
    fn new(name: RegionName, bounds: ModuleRect) -> Self {
        Self { name, bounds }
    }
}

/// Compute the protected regions of a symbol.
///
/// Pure function of the version: the three finder patterns are 7x7
/// squares at modules (0,0), (N-7,0) and (0,N-7); the timing patterns
/// run along row/column 6; format info strips sit next to each finder,
/// and symbols of version 7 and up add the two 6x3 version info blocks.
///
/// Fails only when the matrix side length is inconsistent with its
/// version, which indicates a construction bug upstream.
pub fn locate(matrix: &SymbolMatrix) -> Result<Vec<ProtectedRegion>> {
    let n = matrix.side();
    let version = matrix.version();
    if n != 17 + 4 * u32::from(version) {
        return Err(SymbolError::MalformedMatrix { side: n, version });
    }

    let f = FINDER_SIDE;
    let mut regions = vec![
        ProtectedRegion::new(RegionName::FinderTl, ModuleRect::new(0, 0, f, f)),
        ProtectedRegion::new(RegionName::FinderTr, ModuleRect::new(n - f, 0, f, f)),
        ProtectedRegion::new(RegionName::FinderBl, ModuleRect::new(0, n - f, f, f)),
        ProtectedRegion::new(RegionName::TimingRow, ModuleRect::new(8, 6, n - 16, 1)),
        ProtectedRegion::new(RegionName::TimingCol, ModuleRect::new(6, 8, 1, n - 16)),
        // Format info: the L around the top-left finder plus the copies
        // under the top-right and beside the bottom-left finders.
        ProtectedRegion::new(RegionName::FormatInfo, ModuleRect::new(0, 8, 9, 1)),
        ProtectedRegion::new(RegionName::FormatInfo, ModuleRect::new(8, 0, 1, 9)),
        ProtectedRegion::new(RegionName::FormatInfo, ModuleRect::new(n - 8, 8, 8, 1)),
        ProtectedRegion::new(RegionName::FormatInfo, ModuleRect::new(8, n - 7, 1, 7)),
    ];

    if version >= 7 {
        regions.push(ProtectedRegion::new(
            RegionName::VersionInfo,
            ModuleRect::new(n - 11, 0, 3, 6),
        ));
        regions.push(ProtectedRegion::new(
            RegionName::VersionInfo,
            ModuleRect::new(0, n - 11, 6, 3),
        ));
    }

    debug!(version, side = n, count = regions.len(), "Located protected regions");
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::EcLevel;

    fn matrix_for_version(version: u8) -> SymbolMatrix {
        let side = 17 + 4 * u32::from(version);
        SymbolMatrix::from_modules(
            vec![false; (side * side) as usize],
            version,
            EcLevel::H,
            4,
        )
        .unwrap()
    }

    #[test]
    fn every_version_has_exactly_three_finders() {
        for version in 1..=40u8 {
            let m = matrix_for_version(version);
            let regions = locate(&m).unwrap();
            let finders: Vec<_> = regions
                .iter()
                .filter(|r| {
                    matches!(
                        r.name,
                        RegionName::FinderTl | RegionName::FinderTr | RegionName::FinderBl
                    )
                })
                .collect();
            assert_eq!(finders.len(), 3, "version {version}");
            for f in &finders {
                assert_eq!((f.bounds.w, f.bounds.h), (7, 7), "version {version}");
            }
        }
    }

    #[test]
    fn finder_offsets_follow_the_standard() {
        for version in [1u8, 7, 20, 40] {
            let m = matrix_for_version(version);
            let n = m.side();
            let regions = locate(&m).unwrap();
            let at = |name| {
                regions
                    .iter()
                    .find(|r| r.name == name)
                    .map(|r| (r.bounds.x, r.bounds.y))
                    .unwrap()
            };
            assert_eq!(at(RegionName::FinderTl), (0, 0));
            assert_eq!(at(RegionName::FinderTr), (n - 7, 0));
            assert_eq!(at(RegionName::FinderBl), (0, n - 7));
        }
    }

    #[test]
    fn version_info_appears_from_version_seven() {
        let without = locate(&matrix_for_version(6)).unwrap();
        assert!(!without.iter().any(|r| r.name == RegionName::VersionInfo));

        let with = locate(&matrix_for_version(7)).unwrap();
        let count = with
            .iter()
            .filter(|r| r.name == RegionName::VersionInfo)
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn timing_patterns_span_between_finders() {
        let m = matrix_for_version(3);
        let n = m.side();
        let regions = locate(&m).unwrap();
        let row = regions
            .iter()
            .find(|r| r.name == RegionName::TimingRow)
            .unwrap();
        assert_eq!(row.bounds.y, 6);
        assert_eq!(row.bounds.x, 8);
        assert_eq!(row.bounds.right(), n - 8);
    }

    #[test]
    fn malformed_matrix_is_rejected() {
        let m = SymbolMatrix::from_modules(vec![false; 21 * 21], 1, EcLevel::H, 4).unwrap();
        // Tamper with nothing: instead build one with an impossible pairing.
        let bad = SymbolMatrix::from_modules(vec![false; 25 * 25], 1, EcLevel::H, 4);
        assert!(bad.is_err());
        assert!(locate(&m).is_ok());
    }
}
