// uranai_core/src/generator/pricing.rs

use crate::generator::text_model::Usage;

/// Cost model for generation calls.
///
/// Rates are in USD per token; the result is converted with `exchange_rate`
/// (JPY per USD) and rounded to 2 decimal places. Missing usage is costed at
/// zero rather than treated as an error.
#[derive(Debug, Clone, Copy)]
pub struct Pricing {
  pub input_rate: f64,
  pub output_rate: f64,
  pub exchange_rate: f64,
}

impl Default for Pricing {
  fn default() -> Self {
    // Claude 3.5 Sonnet list price: $3.00 / 1M input tokens,
    // $15.00 / 1M output tokens, converted at a flat 150 JPY/USD.
    Pricing {
      input_rate: 3.0 / 1_000_000.0,
      output_rate: 15.0 / 1_000_000.0,
      exchange_rate: 150.0,
    }
  }
}

impl Pricing {
  pub fn cost(&self, usage: Option<&Usage>) -> f64 {
    let usage = match usage {
      Some(usage) => usage,
      None => return 0.0,
    };
    let input = usage.input_tokens as f64 * self.input_rate * self.exchange_rate;
    let output = usage.output_tokens as f64 * self.output_rate * self.exchange_rate;
    ((input + output) * 100.0).round() / 100.0
  }
}
