//! Normalized identifiers for clusters and areas.
//!
//! Every cluster carries an identifier derived from its display name:
//! case-folded, trimmed, with runs of non-alphanumeric characters collapsed
//! to a single separator. Identifiers are what files and cross-references
//! use; display names are only for output.

/// Derive the normalized identifier from a display name.
///
/// Lowercases, trims, and collapses every run of non-alphanumeric characters
/// into one `_`. Leading and trailing separators are dropped so that
/// `"  Gas - CCGT  "` and `"gas ccgt"` map to the same id.
pub fn transform_name_into_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            for lc in c.to_lowercase() {
                id.push(lc);
            }
        } else {
            pending_sep = true;
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(transform_name_into_id("  Nuclear  "), "nuclear");
    }

    #[test]
    fn collapses_non_alphanumerics() {
        assert_eq!(transform_name_into_id("Gas - CCGT"), "gas_ccgt");
        assert_eq!(transform_name_into_id("a***b"), "a_b");
    }

    #[test]
    fn drops_leading_and_trailing_separators() {
        assert_eq!(transform_name_into_id("--wind--"), "wind");
    }

    #[test]
    fn same_id_for_equivalent_names() {
        assert_eq!(
            transform_name_into_id("Coal  (old)"),
            transform_name_into_id("coal old")
        );
    }
}
