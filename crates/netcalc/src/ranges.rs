//! Tag range parsing
//!
//! VLAN and VXLAN windows are configured as human-readable strings such as
//! `"100-200,300"` — a comma-separated list of single ids or inclusive
//! `min-max` pairs. An empty string is a valid input meaning "no explicit
//! range configured" and parses to an empty list; it is deliberately
//! distinct from a parse failure.

use crate::error::NetCalcError;

/// Kind of tag a range string describes; bounds differ per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// 802.1Q VLAN id, usable range 1-4094 (0 and 4095 are reserved)
    Vlan,
    /// VXLAN network identifier, 24-bit id space
    Vxlan,
}

impl TagKind {
    /// Lowest and highest id a configured range may name
    #[must_use]
    pub fn bounds(self) -> (u32, u32) {
        match self {
            TagKind::Vlan => (1, 4094),
            TagKind::Vxlan => (1, (1 << 24) - 1),
        }
    }

    fn label(self) -> &'static str {
        match self {
            TagKind::Vlan => "vlan",
            TagKind::Vxlan => "vxlan",
        }
    }
}

/// One inclusive range of tag ids, `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRange {
    /// First id in the range
    pub min: u32,
    /// Last id in the range (inclusive)
    pub max: u32,
}

/// Parse a comma-separated tag range string.
///
/// Each item is either a single id (`"30"`) or an inclusive pair
/// (`"10-20"`); whitespace around items is tolerated. Returns an empty
/// Vec for an empty input string.
pub fn parse_tag_ranges(ranges: &str, kind: TagKind) -> Result<Vec<TagRange>, NetCalcError> {
    if ranges.trim().is_empty() {
        return Ok(Vec::new());
    }

    let label = kind.label();
    let (lo, hi) = kind.bounds();
    let mut parsed = Vec::new();

    for item in ranges.split(',') {
        let item = item.trim();
        let invalid = || NetCalcError::InvalidRange {
            kind: label,
            item: item.to_string(),
        };

        let (min, max) = match item.split_once('-') {
            Some((min_str, max_str)) => {
                // A second dash means a malformed item, not a negative id
                if max_str.contains('-') {
                    return Err(invalid());
                }
                let min = min_str.trim().parse::<u32>().map_err(|_| invalid())?;
                let max = max_str.trim().parse::<u32>().map_err(|_| invalid())?;
                (min, max)
            }
            None => {
                let id = item.parse::<u32>().map_err(|_| invalid())?;
                (id, id)
            }
        };

        if min > max {
            return Err(NetCalcError::RangeInverted {
                kind: label,
                min,
                max,
            });
        }
        for value in [min, max] {
            if value < lo || value > hi {
                return Err(NetCalcError::TagOutOfBounds {
                    kind: label,
                    value,
                    lo,
                    hi,
                });
            }
        }

        parsed.push(TagRange { min, max });
    }

    Ok(parsed)
}
