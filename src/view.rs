use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::user::AnnotatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Filtered-and-sorted projection of the cache actually shown to an
/// observer. Pure: always returns a fresh `Vec`, never mutates `cache`.
///
/// The filter keeps a record iff any searchable field contains the trimmed
/// query, case-insensitively. The sort compares string values of the named
/// field, also case-insensitively; unknown fields compare equal, and the
/// underlying sort is stable, so equal keys keep their original relative
/// order.
pub fn derive_view(
    cache: &[AnnotatedUser],
    query: &str,
    sort: Option<&SortSpec>,
) -> Vec<AnnotatedUser> {
    let needle = query.trim().to_lowercase();
    let mut view: Vec<AnnotatedUser> = if needle.is_empty() {
        cache.to_vec()
    } else {
        cache
            .iter()
            .filter(|user| {
                user.searchable_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    };

    if let Some(spec) = sort {
        view.sort_by(|a, b| {
            let ordering = match (a.sort_value(&spec.field), b.sort_value(&spec.field)) {
                (Some(left), Some(right)) => left.to_lowercase().cmp(&right.to_lowercase()),
                _ => Ordering::Equal,
            };
            match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    view
}
