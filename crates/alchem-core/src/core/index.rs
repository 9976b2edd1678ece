//! Row index construction.

use crate::core::models::frame::{FrameIndex, RowKey, TIME_LEVEL};
use crate::core::models::state::StateLabel;
use crate::core::models::table::RawTable;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("table has no time column")]
    MissingTime,
    #[error("state vector {state} does not match lambda levels {names:?}")]
    StateArity { state: StateLabel, names: Vec<String> },
    #[error("index level '{0}' collides with another level or a data column")]
    LevelCollision(String),
}

/// Builds the frame index of `table`: its first column as time, plus one
/// constant level per lambda component when the window's state is known.
///
/// A scalar state is repeated for every level; a tuple must have exactly one
/// value per level.
pub fn build_index(
    table: &RawTable,
    state: Option<(&[String], &StateLabel)>,
) -> Result<FrameIndex, IndexError> {
    let (_, times) = table.time().ok_or(IndexError::MissingTime)?;

    let (level_names, state_values) = match state {
        Some((names, label)) => {
            let values = label
                .broadcast(names.len())
                .ok_or_else(|| IndexError::StateArity {
                    state: label.clone(),
                    names: names.to_vec(),
                })?;
            (names.to_vec(), values)
        }
        None => (Vec::new(), Vec::new()),
    };

    let keys = times
        .iter()
        .map(|&time| RowKey {
            time,
            state: state_values.clone(),
        })
        .collect();
    Ok(FrameIndex::new(level_names, keys))
}

/// Ensures no index level shares a name with the time level, another level,
/// or any value column.
pub fn check_level_collisions<K: Display>(
    index: &FrameIndex,
    columns: &[K],
) -> Result<(), IndexError> {
    let column_names: Vec<String> = columns.iter().map(ToString::to_string).collect();
    for (i, level) in index.level_names().iter().enumerate() {
        if level == TIME_LEVEL
            || index.level_names()[..i].contains(level)
            || column_names.contains(level)
        {
            return Err(IndexError::LevelCollision(level.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_times(times: &[f64]) -> RawTable {
        let mut t = RawTable::new(vec!["time".into(), "x".into()]);
        for &time in times {
            t.push_row(&[time, 0.0]).unwrap();
        }
        t
    }

    fn levels(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn time_only_index_when_state_is_unknown() {
        let index = build_index(&table_with_times(&[0.0, 2.0, 4.0]), None).unwrap();
        assert!(index.level_names().is_empty());
        assert_eq!(index.times().collect::<Vec<_>>(), vec![0.0, 2.0, 4.0]);
        assert!(index.keys().iter().all(|k| k.state.is_empty()));
    }

    #[test]
    fn tuple_state_is_attached_to_every_row() {
        let names = levels(&["Coulomb", "VDW"]);
        let label = StateLabel::Tuple(vec![0.2, 1.0]);
        let index = build_index(&table_with_times(&[0.0, 1.0]), Some((&names, &label))).unwrap();

        assert_eq!(index.level_names(), &names[..]);
        assert_eq!(
            index.keys(),
            &[
                RowKey {
                    time: 0.0,
                    state: vec![0.2, 1.0]
                },
                RowKey {
                    time: 1.0,
                    state: vec![0.2, 1.0]
                }
            ]
        );
    }

    #[test]
    fn scalar_state_is_broadcast_to_each_level() {
        let names = levels(&["Coulomb", "VDW"]);
        let label = StateLabel::Scalar(0.5);
        let index = build_index(&table_with_times(&[0.0]), Some((&names, &label))).unwrap();
        assert_eq!(index.keys()[0].state, vec![0.5, 0.5]);
    }

    #[test]
    fn mismatched_state_arity_is_an_error() {
        let names = levels(&["Coulomb", "VDW"]);
        let label = StateLabel::Tuple(vec![0.1, 0.2, 0.3]);
        let err = build_index(&table_with_times(&[0.0]), Some((&names, &label))).unwrap_err();
        assert!(matches!(err, IndexError::StateArity { .. }));
    }

    #[test]
    fn empty_table_has_no_time_column() {
        let err = build_index(&RawTable::default(), None).unwrap_err();
        assert_eq!(err, IndexError::MissingTime);
    }

    #[test]
    fn row_order_follows_file_order() {
        let index = build_index(&table_with_times(&[5.0, 1.0, 3.0]), None).unwrap();
        assert_eq!(index.times().collect::<Vec<_>>(), vec![5.0, 1.0, 3.0]);
    }

    #[test]
    fn level_named_like_a_value_column_collides() {
        let names = levels(&["Coulomb"]);
        let label = StateLabel::Scalar(0.0);
        let index = build_index(&table_with_times(&[0.0]), Some((&names, &label))).unwrap();
        assert_eq!(
            check_level_collisions(&index, &["Coulomb".to_string()]),
            Err(IndexError::LevelCollision("Coulomb".into()))
        );
        assert!(check_level_collisions(&index, &["VDW".to_string()]).is_ok());
    }

    #[test]
    fn level_named_time_collides() {
        let names = levels(&["time"]);
        let label = StateLabel::Scalar(0.0);
        let index = build_index(&table_with_times(&[0.0]), Some((&names, &label))).unwrap();
        let columns: Vec<StateLabel> = Vec::new();
        assert!(check_level_collisions(&index, &columns).is_err());
    }
}
