//! Extraction of trigger outputs and their shaping for a target.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::{Datum, Value};
use crate::mapping::{Binding, ColumnMap, ColumnRef, ColumnSet};
use crate::schema::Column;

use super::action::Action;

/// One value emitted by a fired action.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutput {
    pub source_id: ColumnRef,
    pub column: Column,
    pub value: Value,
}

/// Values of one source column as delivered to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOutput {
    pub source_id: ColumnRef,
    /// Target column with the same code, if the target binds one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ColumnRef>,
    /// Target dataset holding `target_id`, for multi-dataset targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dataset: Option<String>,
    /// The source column.
    pub column: Column,
    /// Distinct non-null values in first-seen order.
    pub values: Vec<Value>,
}

/// Read the action's output roles from each datum of the payload.
///
/// Multi-valued roles produce one output per bound column. Roles the column
/// map lacks and values the datum lacks are skipped.
pub fn extract_outputs(action: &Action, columns: &ColumnMap, payload: &[Datum]) -> Vec<TriggerOutput> {
    let mut outputs = Vec::new();
    for datum in payload {
        for role in &action.output {
            let Some(binding) = columns.binding(role) else {
                continue;
            };
            let refs: Vec<(ColumnRef, &Column)> = match binding {
                Binding::Single(col) => vec![(ColumnRef::new(role.clone()), col)],
                Binding::Multiple(cols) => cols
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| (ColumnRef::indexed(role.clone(), idx), col))
                    .collect(),
            };
            for (source_id, column) in refs {
                if let Some(value) = datum.get(&source_id) {
                    outputs.push(TriggerOutput {
                        source_id,
                        column: column.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }
    outputs
}

/// Group raw outputs by source column for delivery to a target.
///
/// `passes` decides which source columns reach the target. Each group carries
/// the target column whose code matches the source column's code.
pub fn format_outputs<P>(raw: &[TriggerOutput], passes: P, target: &ColumnSet) -> Vec<InteractionOutput>
where
    P: Fn(&ColumnRef) -> bool,
{
    let mut grouped: IndexMap<&ColumnRef, InteractionOutput> = IndexMap::new();
    for output in raw.iter().filter(|o| passes(&o.source_id)) {
        let entry = grouped.entry(&output.source_id).or_insert_with(|| {
            let found = target.find_by_code(&output.column.code);
            InteractionOutput {
                source_id: output.source_id.clone(),
                target_id: found.as_ref().map(|(_, r)| r.clone()),
                target_dataset: found.and_then(|(ds, _)| ds.map(str::to_string)),
                column: output.column.clone(),
                values: Vec::new(),
            }
        });
        if !output.value.is_null() && !entry.values.contains(&output.value) {
            entry.values.push(output.value.clone());
        }
    }
    grouped.into_values().collect()
}
