/// Boltzmann's constant in kJ/(mol·K).
pub const BOLTZMANN_KJ_PER_MOL_K: f64 = 8.3144621e-3;

/// Returns β = 1/(k_B·T) in mol/kJ, or `None` unless `temperature_k` is finite and positive.
#[inline]
pub fn beta(temperature_k: f64) -> Option<f64> {
    if temperature_k.is_finite() && temperature_k > 0.0 {
        Some(1.0 / (BOLTZMANN_KJ_PER_MOL_K * temperature_k))
    } else {
        None
    }
}
