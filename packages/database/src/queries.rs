//! SQL generation for partition fetches.
//!
//! Month partitions are separate tables named `MM_YYYY`, so the partition
//! identifier is validated before interpolation. Category values go into
//! an `IN` list with escaping; the authority name is a bound parameter.

use works_map_permit_models::CategoryFilter;

use crate::{AuthorityFilter, KNOWN_AUTHORITIES};

/// Whether `month` is a well-formed `MM_YYYY` partition identifier.
#[must_use]
pub fn is_valid_month(month: &str) -> bool {
    let bytes = month.as_bytes();
    if bytes.len() != 7 || bytes[2] != b'_' {
        return false;
    }
    if !month[..2].bytes().all(|b| b.is_ascii_digit())
        || !month[3..].bytes().all(|b| b.is_ascii_digit())
    {
        return false;
    }
    matches!(month[..2].parse::<u8>(), Ok(1..=12))
}

/// Escapes a string for use inside a single-quoted SQL literal.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Renders the compiled category filter as a SQL predicate.
///
/// The match-all filter renders as `1=1`, mirroring the absence of a
/// `WHERE` restriction.
#[must_use]
pub fn category_clause(filter: &CategoryFilter) -> String {
    filter.raw_values().map_or_else(
        || "1=1".to_string(),
        |values| {
            let list: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
            format!("work_category IN ({})", list.join(", "))
        },
    )
}

fn authority_clause(authority: &AuthorityFilter) -> String {
    match authority {
        AuthorityFilter::One(_) => "highway_authority = ?".to_string(),
        AuthorityFilter::All => {
            let list: Vec<String> = KNOWN_AUTHORITIES
                .iter()
                .map(|name| quote_literal(name))
                .collect();
            format!("highway_authority IN ({})", list.join(", "))
        }
    }
}

/// Builds the partition fetch query.
///
/// `DISTINCT ON (permit_reference_number)` collapses duplicate permit
/// rows within the partition; downstream stages rely on that. Only
/// completed work-stop events are street works that actually happened.
#[must_use]
pub fn fetch_query(
    schema: &str,
    month: &str,
    authority: &AuthorityFilter,
    filter: &CategoryFilter,
) -> String {
    format!(
        "SELECT DISTINCT ON (permit_reference_number) \
             permit_reference_number, \
             activity_type, \
             work_category, \
             work_status_ref, \
             event_type, \
             works_location_coordinates \
         FROM {schema}.\"{month}\" \
         WHERE {} \
         AND work_status_ref = 'completed' \
         AND event_type = 'WORK_STOP' \
         AND ({})",
        authority_clause(authority),
        category_clause(filter),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use works_map_permit_models::WorkCategory;

    use super::*;

    #[test]
    fn month_validation_accepts_partition_table_names() {
        for month in ["01_2025", "06_2025", "12_2024"] {
            assert!(is_valid_month(month), "{month} should be valid");
        }
    }

    #[test]
    fn month_validation_rejects_anything_else() {
        for month in [
            "13_2025",
            "00_2025",
            "6_2025",
            "06-2025",
            "062025",
            "06_20x5",
            "june",
            "",
            "06_2025; DROP TABLE works",
        ] {
            assert!(!is_valid_month(month), "{month} should be rejected");
        }
    }

    #[test]
    fn match_all_filter_renders_as_no_restriction() {
        assert_eq!(category_clause(&CategoryFilter::match_all()), "1=1");
    }

    #[test]
    fn compiled_filter_renders_as_in_list() {
        let filter = CategoryFilter::compile(&BTreeSet::from([WorkCategory::Major]));
        assert_eq!(
            category_clause(&filter),
            "work_category IN ('Major', 'Major (PAA)')"
        );
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn single_authority_query_binds_a_parameter() {
        let query = fetch_query(
            "street_works",
            "06_2025",
            &AuthorityFilter::One("NEWCASTLE CITY COUNCIL".to_string()),
            &CategoryFilter::match_all(),
        );
        assert!(query.contains("DISTINCT ON (permit_reference_number)"));
        assert!(query.contains("highway_authority = ?"));
        assert!(query.contains("work_status_ref = 'completed'"));
        assert!(query.contains("event_type = 'WORK_STOP'"));
        assert!(query.contains("FROM street_works.\"06_2025\""));
    }

    #[test]
    fn all_authorities_query_lists_every_known_authority() {
        let query = fetch_query(
            "street_works",
            "06_2025",
            &AuthorityFilter::All,
            &CategoryFilter::match_all(),
        );
        for name in KNOWN_AUTHORITIES {
            assert!(query.contains(name), "query should mention {name}");
        }
        assert!(!query.contains('?'));
    }
}
