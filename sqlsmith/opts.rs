use garde::Validate;
use serde::{Deserialize, Serialize};

/// Knobs of the generator. Defaults reproduce the classic sqlsmith weights.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct GenerationOpts {
    /// Attempts per dispatch level before giving up on a subtree.
    #[garde(range(min = 1))]
    pub retry_count: u32,
    /// Scope depth at which only terminal variants are produced. `None`
    /// leaves recursion bounded only by the dice.
    #[garde(range(min = 1))]
    pub max_depth: Option<u32>,
    #[garde(custom(probability))]
    pub insert_prob: f64,
    #[garde(custom(probability))]
    pub null_literal_prob: f64,
    #[garde(custom(probability))]
    pub distinct_prob: f64,
    #[garde(custom(probability))]
    pub limit_prob: f64,
    #[garde(range(min = 1))]
    pub max_limit: u32,
    #[garde(range(min = 1))]
    pub max_values_rows: u32,
}

/// A value in `[0, 1]`. NaN is rejected.
fn probability(value: &f64, _: &()) -> garde::Result {
    if !(0.0..=1.0).contains(value) {
        return Err(garde::Error::new(format!(
            "`{value}` is not a probability in [0, 1]"
        )));
    }
    Ok(())
}

impl Default for GenerationOpts {
    fn default() -> Self {
        Self {
            retry_count: 20,
            max_depth: Some(24),
            insert_prob: 1.0 / 3.0,
            null_literal_prob: 1.0 / 6.0,
            distinct_prob: 1.0 / 100.0,
            limit_prob: 2.0 / 3.0,
            max_limit: 100,
            max_values_rows: 5,
        }
    }
}
