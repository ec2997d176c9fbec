//! Validation of a column set against a plugin's mapping schema.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plugin::MappingSchema;

use super::column_map::{Binding, ColumnMap};
use super::column_set::ColumnSet;

/// A mismatch between a visualization's columns and its plugin's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum SchemaIssue {
    MissingRequired {
        dataset: Option<String>,
        role: String,
    },
    IncompatibleType {
        dataset: Option<String>,
        role: String,
        column: String,
        expected: String,
    },
    NotMultiple {
        dataset: Option<String>,
        role: String,
    },
    UnknownRole {
        dataset: Option<String>,
        role: String,
    },
    UnknownDataset {
        dataset: String,
    },
    MissingDataset {
        dataset: String,
    },
    /// Column set and schema disagree on single versus multi-dataset.
    ShapeMismatch,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = |dataset: &Option<String>| match dataset {
            Some(ds) => format!(" in dataset '{}'", ds),
            None => String::new(),
        };
        match self {
            SchemaIssue::MissingRequired { dataset, role } => {
                write!(f, "required role '{}' is not bound{}", role, at(dataset))
            }
            SchemaIssue::IncompatibleType {
                dataset,
                role,
                column,
                expected,
            } => write!(
                f,
                "column '{}' on role '{}'{} is not a {} column",
                column,
                role,
                at(dataset),
                expected
            ),
            SchemaIssue::NotMultiple { dataset, role } => {
                write!(f, "role '{}'{} takes a single column", role, at(dataset))
            }
            SchemaIssue::UnknownRole { dataset, role } => {
                write!(f, "role '{}'{} is not declared", role, at(dataset))
            }
            SchemaIssue::UnknownDataset { dataset } => {
                write!(f, "dataset '{}' is not declared", dataset)
            }
            SchemaIssue::MissingDataset { dataset } => {
                write!(f, "dataset '{}' has no columns", dataset)
            }
            SchemaIssue::ShapeMismatch => {
                f.write_str("single and multi-dataset column mapping mismatch")
            }
        }
    }
}

/// Check a column set against a mapping schema.
///
/// Issues are collected, never raised: a visualization with a partial
/// mapping still renders, with unresolved references failing closed.
pub fn validate(columns: &ColumnSet, schema: &MappingSchema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    match (columns, schema) {
        (ColumnSet::Single(map), MappingSchema::Single(_)) => {
            check_map(map, schema, None, &mut issues);
        }
        (ColumnSet::Datasets(maps), MappingSchema::Datasets(sets)) => {
            for key in maps.keys().filter(|k| !sets.contains_key(*k)) {
                issues.push(SchemaIssue::UnknownDataset {
                    dataset: key.clone(),
                });
            }
            for key in sets.keys() {
                match maps.get(key) {
                    Some(map) => check_map(map, schema, Some(key), &mut issues),
                    None => issues.push(SchemaIssue::MissingDataset {
                        dataset: key.clone(),
                    }),
                }
            }
        }
        _ => issues.push(SchemaIssue::ShapeMismatch),
    }
    issues
}

fn check_map(map: &ColumnMap, schema: &MappingSchema, dataset: Option<&str>, issues: &mut Vec<SchemaIssue>) {
    let owned = || dataset.map(str::to_string);
    let params = schema.parameters(dataset).unwrap_or(&[]);

    for param in params {
        let binding = map.binding(&param.target_property);
        let bound = binding.is_some_and(|b| !b.columns().is_empty());
        if param.required && !bound {
            issues.push(SchemaIssue::MissingRequired {
                dataset: owned(),
                role: param.target_property.clone(),
            });
        }
        let Some(binding) = binding else {
            continue;
        };
        if let Binding::Multiple(cols) = binding {
            if !param.multiple && cols.len() > 1 {
                issues.push(SchemaIssue::NotMultiple {
                    dataset: owned(),
                    role: param.target_property.clone(),
                });
            }
        }
        for column in binding.columns() {
            if !param.kind.accepts(column) {
                issues.push(SchemaIssue::IncompatibleType {
                    dataset: owned(),
                    role: param.target_property.clone(),
                    column: column.name.clone(),
                    expected: param.kind.label().to_string(),
                });
            }
        }
    }

    for role in map.roles() {
        if !params.iter().any(|p| p.target_property == role) {
            issues.push(SchemaIssue::UnknownRole {
                dataset: owned(),
                role: role.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{MappingParameter, ParameterType};
    use crate::schema::{Column, DataType};
    use indexmap::IndexMap;

    fn pie_schema() -> MappingSchema {
        MappingSchema::Single(vec![
            MappingParameter::new("category", "Category", ParameterType::Dim).required(),
            MappingParameter::new("measure", "Measure", ParameterType::Measure).required(),
            MappingParameter::new("vary", "Vary By", ParameterType::Dim).multiple(),
        ])
    }

    #[test]
    fn test_valid_mapping_has_no_issues() {
        let map = ColumnMap::new()
            .with_single("category", Column::new("c", "Region"))
            .with_single("measure", Column::new("m", "Revenue").with_type(DataType::Double));
        assert!(validate(&map.into(), &pie_schema()).is_empty());
    }

    #[test]
    fn test_issues_are_collected() {
        let map = ColumnMap::new()
            .with_single("measure", Column::new("m", "Region"))
            .with_single("colour", Column::new("x", "X"));
        let issues = validate(&map.into(), &pie_schema());
        assert_eq!(
            issues,
            vec![
                SchemaIssue::MissingRequired {
                    dataset: None,
                    role: "category".into()
                },
                SchemaIssue::IncompatibleType {
                    dataset: None,
                    role: "measure".into(),
                    column: "Region".into(),
                    expected: "measure".into()
                },
                SchemaIssue::UnknownRole {
                    dataset: None,
                    role: "colour".into()
                },
            ]
        );
    }

    #[test]
    fn test_multiple_on_single_role() {
        let schema = MappingSchema::Single(vec![MappingParameter::new(
            "category",
            "Category",
            ParameterType::Dim,
        )]);
        let map = ColumnMap::new().with_multiple(
            "category",
            vec![Column::new("a", "A"), Column::new("b", "B")],
        );
        let issues = validate(&map.into(), &schema);
        assert!(matches!(issues[0], SchemaIssue::NotMultiple { .. }));
    }

    #[test]
    fn test_dataset_issues() {
        let mut params = IndexMap::new();
        params.insert(
            "Points".to_string(),
            vec![MappingParameter::new("lat", "Latitude", ParameterType::Fact).required()],
        );
        params.insert("Choropleth".to_string(), vec![]);
        let schema = MappingSchema::Datasets(params);

        let mut maps = IndexMap::new();
        maps.insert("Points".to_string(), ColumnMap::new());
        maps.insert("Heat".to_string(), ColumnMap::new());
        let issues = validate(&ColumnSet::Datasets(maps), &schema);

        assert!(issues.contains(&SchemaIssue::UnknownDataset {
            dataset: "Heat".into()
        }));
        assert!(issues.contains(&SchemaIssue::MissingDataset {
            dataset: "Choropleth".into()
        }));
        assert!(issues.contains(&SchemaIssue::MissingRequired {
            dataset: Some("Points".into()),
            role: "lat".into()
        }));
        assert_eq!(
            validate(&ColumnSet::default(), &schema),
            vec![SchemaIssue::ShapeMismatch]
        );
    }
}
