#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Permit record types and the work category taxonomy.
//!
//! This crate defines the canonical normalized work categories used across
//! the works-map system, the fixed mapping from the raw category strings
//! found in permit data, and the compiled category filter that upstream
//! query layers apply when fetching rows.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Normalized work category for a street-works permit.
///
/// Raw permit data uses eight distinct `work_category` values; this enum
/// collapses them into the four categories users filter by, plus
/// [`Other`](Self::Other) for anything unrecognized.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum WorkCategory {
    /// Major works, including those under a Provisional Advance
    /// Authorisation ("Major (PAA)").
    Major,
    /// Immediate works, both emergency and urgent.
    Emergency,
    /// Standard works.
    Standard,
    /// Minor works.
    Minor,
    /// Any raw category value not covered by the mapping table.
    Other,
}

impl WorkCategory {
    /// The raw `work_category` values that normalize to this category.
    ///
    /// This is the fixed mapping table; [`Other`](Self::Other) has no raw
    /// values of its own (it is the fallback label).
    #[must_use]
    pub const fn raw_values(self) -> &'static [&'static str] {
        match self {
            Self::Major => &["Major", "Major (PAA)"],
            Self::Emergency => &["Immediate - emergency", "Immediate - urgent"],
            Self::Standard => &["Standard"],
            Self::Minor => &["Minor"],
            Self::Other => &[],
        }
    }

    /// The categories users can select in a filter, in match order.
    #[must_use]
    pub const fn selectable() -> &'static [Self] {
        &[Self::Major, Self::Emergency, Self::Standard, Self::Minor]
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Major,
            Self::Emergency,
            Self::Standard,
            Self::Minor,
            Self::Other,
        ]
    }

    /// Normalizes a raw `work_category` value, first match wins.
    ///
    /// Values outside the mapping table normalize to
    /// [`Other`](Self::Other), never an error.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        for category in Self::selectable() {
            if category.raw_values().contains(&raw) {
                return *category;
            }
        }
        Self::Other
    }
}

/// A compiled inclusion predicate over raw `work_category` values.
///
/// Compiled from a set of selected [`WorkCategory`] values. An empty
/// selection compiles to the match-everything predicate: the absence of a
/// filter is not the same as "exclude everything".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    /// `None` means match everything.
    raw_values: Option<BTreeSet<String>>,
}

impl CategoryFilter {
    /// The predicate that matches every raw category value.
    #[must_use]
    pub const fn match_all() -> Self {
        Self { raw_values: None }
    }

    /// Compiles a selection of normalized categories into a raw-value
    /// predicate.
    ///
    /// Selected categories outside the mapping table (i.e.
    /// [`WorkCategory::Other`]) contribute no raw values and are ignored.
    /// A selection that contributes no raw values at all compiles to
    /// [`match_all`](Self::match_all), matching the behavior of the
    /// upstream filter UI.
    #[must_use]
    pub fn compile(selected: &BTreeSet<WorkCategory>) -> Self {
        let raw_values: BTreeSet<String> = selected
            .iter()
            .flat_map(|category| category.raw_values())
            .map(ToString::to_string)
            .collect();

        if raw_values.is_empty() {
            Self::match_all()
        } else {
            Self {
                raw_values: Some(raw_values),
            }
        }
    }

    /// Whether a raw `work_category` value passes this filter.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        self.raw_values
            .as_ref()
            .is_none_or(|values| values.contains(raw))
    }

    /// Whether this is the match-everything predicate.
    #[must_use]
    pub const fn is_match_all(&self) -> bool {
        self.raw_values.is_none()
    }

    /// The raw values this filter includes, or `None` for match-all.
    #[must_use]
    pub const fn raw_values(&self) -> Option<&BTreeSet<String>> {
        self.raw_values.as_ref()
    }
}

/// One permit row as returned by the query layer.
///
/// The geometry is well-known text in the source projected coordinate
/// system (British National Grid), possibly carrying a Z ordinate. Rows
/// are already deduplicated by permit reference within one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkRecord {
    /// Unique permit reference number.
    pub permit_reference: String,
    /// Free-text activity type label (e.g. "Utility repair and maintenance works").
    pub activity_type: String,
    /// Raw work category value (e.g. "Major (PAA)").
    pub work_category: String,
    /// Work status reference (e.g. "completed").
    pub work_status: String,
    /// Event type (e.g. "`WORK_STOP`").
    pub event_type: String,
    /// Works location as WKT, absent when the source row had none.
    pub geometry_wkt: Option<String>,
}

/// One representative coordinate extracted from a normalized record.
///
/// The input row of the hex aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPoint {
    /// Latitude in degrees (WGS84).
    pub lat: f64,
    /// Longitude in degrees (WGS84).
    pub lng: f64,
    /// Permit reference of the contributing record.
    pub permit_reference: String,
    /// Activity type of the contributing record.
    pub activity_type: String,
}
