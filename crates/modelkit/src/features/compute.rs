//! Turning an input record into a feature row.

use std::ops::Range;

use super::column::{Column, ColumnKind, ColumnValue};
use super::group::FeatureGroup;
use crate::predict::PredictInput;

/// Errors found when pairing feature groups with columns.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValidationError {
    /// Two columns share a name.
    DuplicateColumn { name: String },
    /// A group reads a column that does not exist.
    MissingColumn { group_idx: usize, column: String },
    /// A group reads a column of a kind it cannot handle.
    IncompatibleColumn {
        group_idx: usize,
        column: String,
        kind: &'static str,
    },
    /// A one-hot group's options differ from its column's options.
    OptionsMismatch { group_idx: usize, column: String },
}

/// Columns plus the feature groups computed from them.
///
/// Feature groups are laid out back to back; group `g` owns the features in
/// [`FeaturePipeline::group_range`].
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    columns: Vec<Column>,
    groups: Vec<FeatureGroup>,
    group_columns: Vec<usize>,
    group_offsets: Vec<usize>,
    n_features: usize,
}

impl FeaturePipeline {
    /// Pair every group with its source column and check the kinds agree.
    pub fn new(
        columns: Vec<Column>,
        groups: Vec<FeatureGroup>,
    ) -> Result<Self, FeatureValidationError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(FeatureValidationError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }

        let mut group_columns = Vec::with_capacity(groups.len());
        let mut group_offsets = Vec::with_capacity(groups.len() + 1);
        let mut n_features = 0;

        for (group_idx, group) in groups.iter().enumerate() {
            let name = group.source_column();
            let column_idx = columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| FeatureValidationError::MissingColumn {
                    group_idx,
                    column: name.to_string(),
                })?;
            let column = &columns[column_idx];
            check_compatible(group_idx, group, column)?;

            group_columns.push(column_idx);
            group_offsets.push(n_features);
            n_features += group.n_features();
        }
        group_offsets.push(n_features);

        Ok(Self {
            columns,
            groups,
            group_columns,
            group_offsets,
            n_features,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn groups(&self) -> &[FeatureGroup] {
        &self.groups
    }

    /// Total number of features across all groups.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Feature indices owned by group `group_idx`.
    pub fn group_range(&self, group_idx: usize) -> Range<usize> {
        self.group_offsets[group_idx]..self.group_offsets[group_idx + 1]
    }

    /// Coerce every column of `input`, ignoring keys that match no column.
    pub fn parse<'a>(&self, input: &'a PredictInput) -> Vec<ColumnValue<'a>> {
        self.columns
            .iter()
            .map(|column| column.parse(input.get(&column.name)))
            .collect()
    }

    /// Compute the feature row for `input`.
    pub fn compute(&self, input: &PredictInput) -> Vec<f32> {
        let values = self.parse(input);
        let mut features = vec![0.0; self.n_features];
        for (group_idx, group) in self.groups.iter().enumerate() {
            let value = &values[self.group_columns[group_idx]];
            group.compute(value, &mut features[self.group_range(group_idx)]);
        }
        features
    }
}

fn check_compatible(
    group_idx: usize,
    group: &FeatureGroup,
    column: &Column,
) -> Result<(), FeatureValidationError> {
    let compatible = match (group, &column.kind) {
        (FeatureGroup::Identity { .. }, ColumnKind::Number | ColumnKind::Enum { .. }) => true,
        (FeatureGroup::Normalized { .. }, ColumnKind::Number) => true,
        (FeatureGroup::OneHotEncoded { options, .. }, ColumnKind::Enum { options: column_options }) => {
            if options != column_options {
                return Err(FeatureValidationError::OptionsMismatch {
                    group_idx,
                    column: column.name.clone(),
                });
            }
            true
        }
        (FeatureGroup::BagOfWords(_), ColumnKind::Text) => true,
        _ => false,
    };

    if compatible {
        Ok(())
    } else {
        Err(FeatureValidationError::IncompatibleColumn {
            group_idx,
            column: column.name.clone(),
            kind: kind_name(&column.kind),
        })
    }
}

fn kind_name(kind: &ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Unknown => "unknown",
        ColumnKind::Number => "number",
        ColumnKind::Enum { .. } => "enum",
        ColumnKind::Text => "text",
    }
}
