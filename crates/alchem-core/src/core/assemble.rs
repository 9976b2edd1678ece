//! Reduced-potential and gradient assembly.
//!
//! Both routines work on a deduplicated [`RawTable`] and its [`Classification`]
//! and return bare value columns; row indexing happens afterwards.

use crate::core::classify::classifier::Classification;
use crate::core::models::state::StateLabel;
use crate::core::models::table::RawTable;
use tracing::warn;

/// Which optional energy terms are folded into each reduced potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contributions {
    pub potential_energy: bool,
    pub pressure_volume: bool,
}

impl Default for Contributions {
    fn default() -> Self {
        Self {
            potential_energy: true,
            pressure_volume: true,
        }
    }
}

/// Value columns keyed by `K`, each as long as the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledColumns<K> {
    pub keys: Vec<K>,
    pub values: Vec<Vec<f64>>,
}

/// Computes `u_k = β·(ΔH_k + U + pV)` for every energy-difference column.
///
/// `U` and `pV` contribute zero when the classification holds no such column
/// or the corresponding flag in `contributions` is off. Columns come out in
/// first-encountered order of their target labels; a repeated label keeps its
/// first column.
pub fn reduced_potentials(
    table: &RawTable,
    classification: &Classification,
    beta: f64,
    contributions: Contributions,
) -> AssembledColumns<StateLabel> {
    let potential = classification
        .potential_energy
        .filter(|_| contributions.potential_energy)
        .and_then(|idx| table.column(idx));
    let pressure_volume = classification
        .pressure_volume
        .filter(|_| contributions.pressure_volume)
        .and_then(|idx| table.column(idx));

    let mut keys: Vec<StateLabel> = Vec::with_capacity(classification.energy_differences.len());
    let mut values = Vec::with_capacity(classification.energy_differences.len());

    for (idx, label) in &classification.energy_differences {
        if keys.contains(label) {
            warn!("Dropping repeated target state {} (column {}).", label, idx);
            continue;
        }
        let Some(delta_h) = table.column(*idx) else {
            continue;
        };

        let column = delta_h
            .iter()
            .enumerate()
            .map(|(row, &dh)| {
                let u = potential.map_or(0.0, |c| c[row]);
                let pv = pressure_volume.map_or(0.0, |c| c[row]);
                beta * (dh + u + pv)
            })
            .collect();
        keys.push(label.clone());
        values.push(column);
    }

    AssembledColumns { keys, values }
}

/// Selects one gradient column per lambda component and scales it by β.
///
/// No potential-energy or pV term is added. Fails with the name of the first
/// component that has no matching gradient column.
pub fn gradients(
    table: &RawTable,
    classification: &Classification,
    components: &[String],
    beta: f64,
) -> Result<AssembledColumns<String>, String> {
    let mut values = Vec::with_capacity(components.len());
    for component in components {
        let column = classification
            .gradient_for(table.names(), component)
            .and_then(|idx| table.column(idx))
            .ok_or_else(|| component.clone())?;
        values.push(column.iter().map(|&g| beta * g).collect());
    }
    Ok(AssembledColumns {
        keys: components.to_vec(),
        values,
    })
}
