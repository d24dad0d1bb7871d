//! Instance count resolution for resize-type steps.
//!
//! Pure translation of percentage/absolute targets into concrete instance
//! counts. Rollback steps never call this resolver; they invert a
//! previously recorded `(previous_count, desired_count)` pair instead.

use serde::{Deserialize, Serialize};

/// Unit of a requested resize value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceUnit {
    /// Value is a percentage of the recorded maximum instance count
    Percentage,
    /// Value is an absolute instance count
    Count,
}

/// Direction of a resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeDirection {
    /// Growing the incoming application
    Upsize,
    /// Shrinking the outgoing application
    Downsize,
}

/// Resolve a requested resize value into a concrete instance count.
///
/// Percentages are clamped to `[0, 100]` and rounded half-up against
/// `max_instances`. An upsize never resolves to zero instances. A
/// percentage downsize names the share of capacity the outgoing
/// application keeps: the complement is removed, so complementary
/// upsize/downsize percentages partition `max_instances` between the two
/// applications. An absolute downsize names the count removed.
pub fn resolve_instance_count(
    max_instances: u32,
    requested: u32,
    unit: InstanceUnit,
    direction: ResizeDirection,
) -> u32 {
    match unit {
        InstanceUnit::Percentage => {
            let percent = requested.min(100);
            match direction {
                ResizeDirection::Upsize => {
                    let count = percent_of(percent, max_instances);
                    count.max(1)
                }
                ResizeDirection::Downsize => {
                    let removed = percent_of(100 - percent, max_instances);
                    max_instances.saturating_sub(removed)
                }
            }
        }
        InstanceUnit::Count => match direction {
            ResizeDirection::Upsize => requested,
            ResizeDirection::Downsize => max_instances.saturating_sub(requested),
        },
    }
}

/// Round-half-up integer percentage
fn percent_of(percent: u32, max_instances: u32) -> u32 {
    let numerator = u64::from(percent) * u64::from(max_instances) + 50;
    u32::try_from(numerator / 100).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_upsize_rounds_half_up() {
        assert_eq!(
            resolve_instance_count(10, 25, InstanceUnit::Percentage, ResizeDirection::Upsize),
            3
        );
        assert_eq!(
            resolve_instance_count(10, 24, InstanceUnit::Percentage, ResizeDirection::Upsize),
            2
        );
    }

    #[test]
    fn test_upsize_never_resolves_to_zero() {
        assert_eq!(
            resolve_instance_count(10, 0, InstanceUnit::Percentage, ResizeDirection::Upsize),
            1
        );
        assert_eq!(
            resolve_instance_count(1, 0, InstanceUnit::Percentage, ResizeDirection::Upsize),
            1
        );
    }

    #[test]
    fn test_percentage_values_are_clamped() {
        assert_eq!(
            resolve_instance_count(10, 250, InstanceUnit::Percentage, ResizeDirection::Upsize),
            10
        );
        assert_eq!(
            resolve_instance_count(10, 250, InstanceUnit::Percentage, ResizeDirection::Downsize),
            10
        );
    }

    #[test]
    fn test_complementary_percentages_partition_capacity() {
        for percent in [10, 30, 50, 75, 90] {
            let up =
                resolve_instance_count(10, percent, InstanceUnit::Percentage, ResizeDirection::Upsize);
            let down = resolve_instance_count(
                10,
                100 - percent,
                InstanceUnit::Percentage,
                ResizeDirection::Downsize,
            );
            assert!(
                (up + down).abs_diff(10) <= 1,
                "percent {percent}: {up} + {down} should partition 10"
            );
        }
    }

    #[test]
    fn test_count_upsize_passes_through() {
        assert_eq!(
            resolve_instance_count(10, 4, InstanceUnit::Count, ResizeDirection::Upsize),
            4
        );
    }

    #[test]
    fn test_count_downsize_is_the_remainder() {
        assert_eq!(
            resolve_instance_count(10, 4, InstanceUnit::Count, ResizeDirection::Downsize),
            6
        );
        // over-removal saturates instead of underflowing
        assert_eq!(
            resolve_instance_count(3, 7, InstanceUnit::Count, ResizeDirection::Downsize),
            0
        );
    }
}
