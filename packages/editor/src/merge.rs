//! # Validation Merge
//!
//! Applies a validation result to whatever rows exist when it arrives.
//!
//! The result may have been computed for an older document: an edit can go
//! out before the previous response comes back, and responses carry no
//! sequence number. Exclude rows are therefore matched by position and
//! metadata rows by bound field name, and anything without a counterpart is
//! left unstyled. Only status classes are written; row content is never
//! touched.

use tracing::debug;

use crate::projection::{RowSet, ViewPatch};
use crate::protocol::ValidationResult;

/// Set each row's status from `result`, returning patches for changed rows
pub fn apply_validation(result: &ValidationResult, rows: &mut RowSet) -> Vec<ViewPatch> {
    let mut patches = Vec::new();

    if result.exclude_statuses.len() != rows.excludes().len() {
        debug!(
            rows = rows.excludes().len(),
            statuses = result.exclude_statuses.len(),
            "Validation result shape differs from exclude rows"
        );
    }

    for (position, row) in rows.excludes_mut().iter_mut().enumerate() {
        let status = result
            .exclude_statuses
            .get(position)
            .and_then(|status| status.styled());

        if row.status != status {
            row.status = status;
            patches.push(ViewPatch::SetStatus { id: row.id, status });
        }
    }

    for row in rows.metadata_mut().iter_mut() {
        let status = row
            .field
            .as_ref()
            .and_then(|field| result.metadata_statuses.get(field))
            .and_then(|status| status.styled());

        if row.status != status {
            row.status = status;
            patches.push(ViewPatch::SetStatus { id: row.id, status });
        }
    }

    patches
}
