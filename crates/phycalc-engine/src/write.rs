//! Register write contract.
//!
//! Every unit that targets a hardware field goes through [`resolve_write`],
//! which applies one logical write under a [`WritePolicy`]:
//!
//! 1. a negative value without `allow_negative` fails
//! 2. an allowed negative value is encoded (two's or one's complement)
//! 3. `limit_lower` / `limit_upper` clamp, with a warning on change
//! 4. `saturate` clips into `[0, 2^width - 1]`, with a warning on change
//! 5. an absent value with `use_default` takes the reset value
//! 6. `do_not_care` marks the field unconstrained
//!
//! The caller ([`CalcContext::write_register`](crate::CalcContext::write_register))
//! looks up the field and commits the outcome.

use phycalc_model::Diagnostic;

use crate::error::CalcError;

/// Options for a single register write. Defaults match a plain assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePolicy {
    pub use_default: bool,
    pub do_not_care: bool,
    pub limit_upper: Option<i64>,
    pub limit_lower: Option<i64>,
    pub saturate: bool,
    pub allow_negative: bool,
    pub use_twos_complement: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            use_default: false,
            do_not_care: false,
            limit_upper: None,
            limit_lower: None,
            saturate: false,
            allow_negative: false,
            use_twos_complement: true,
        }
    }
}

impl WritePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_default(mut self) -> Self {
        self.use_default = true;
        self
    }

    pub fn do_not_care(mut self) -> Self {
        self.do_not_care = true;
        self
    }

    pub fn limit_upper(mut self, limit: i64) -> Self {
        self.limit_upper = Some(limit);
        self
    }

    pub fn limit_lower(mut self, limit: i64) -> Self {
        self.limit_lower = Some(limit);
        self
    }

    pub fn limits(self, lower: i64, upper: i64) -> Self {
        self.limit_lower(lower).limit_upper(upper)
    }

    pub fn saturate(mut self) -> Self {
        self.saturate = true;
        self
    }

    pub fn allow_negative(mut self) -> Self {
        self.allow_negative = true;
        self
    }

    /// Encode negatives as `(1 << (width - 1)) - value` instead of two's
    /// complement. Implies nothing about `allow_negative`.
    pub fn ones_complement(mut self) -> Self {
        self.use_twos_complement = false;
        self
    }
}

/// What a write resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Value to assign, if any.
    pub value: Option<i64>,
    pub used_default: bool,
    pub do_not_care: bool,
    /// Soft corrections applied on the way.
    pub corrections: Vec<Diagnostic>,
}

/// Largest unsigned value of a field of `bit_width` bits.
pub fn field_max(bit_width: u8) -> i64 {
    if bit_width >= 63 {
        i64::MAX
    } else {
        (1i64 << bit_width) - 1
    }
}

/// Encode a negative value for a field of `bit_width` bits.
pub fn encode_negative(value: i64, bit_width: u8, twos_complement: bool) -> i64 {
    let width = u32::from(bit_width.min(62));
    if twos_complement {
        (1i64 << width) + value
    } else {
        (1i64 << width.saturating_sub(1)) - value
    }
}

/// Reverse a two's-complement encoding: raw values with the sign bit set
/// come back negative.
pub fn decode_twos_complement(raw: i64, bit_width: u8) -> i64 {
    let width = u32::from(bit_width.clamp(1, 62));
    let sign_bit = 1i64 << (width - 1);
    if raw & sign_bit != 0 {
        raw - (1i64 << width)
    } else {
        raw
    }
}

/// Apply `policy` to a write of `value` to the field `var`.
pub fn resolve_write(
    var: &str,
    bit_width: u8,
    value: Option<i64>,
    default: Option<i64>,
    policy: &WritePolicy,
) -> Result<WriteOutcome, CalcError> {
    let mut outcome = WriteOutcome {
        do_not_care: policy.do_not_care,
        ..WriteOutcome::default()
    };

    if let Some(mut v) = value {
        if v < 0 {
            if !policy.allow_negative {
                return Err(CalcError::NegativeValueNotAllowed {
                    var: var.to_string(),
                    value: v,
                });
            }
            v = encode_negative(v, bit_width, policy.use_twos_complement);
        }

        if let Some(upper) = policy.limit_upper {
            if v > upper {
                outcome.corrections.push(
                    Diagnostic::warning(format!("value {v} limited to upper bound {upper}"))
                        .on_variable(var),
                );
                v = upper;
            }
        }
        if let Some(lower) = policy.limit_lower {
            if v < lower {
                outcome.corrections.push(
                    Diagnostic::warning(format!("value {v} limited to lower bound {lower}"))
                        .on_variable(var),
                );
                v = lower;
            }
        }

        if policy.saturate {
            let clipped = v.clamp(0, field_max(bit_width));
            if clipped != v {
                outcome.corrections.push(
                    Diagnostic::warning(format!(
                        "value {v} saturated to {clipped} for {bit_width}-bit field"
                    ))
                    .on_variable(var),
                );
                v = clipped;
            }
        }
        outcome.value = Some(v);
    } else if policy.use_default {
        if let Some(d) = default {
            outcome.corrections.push(
                Diagnostic::info(format!("no value supplied, using reset value {d}")).on_variable(var),
            );
            outcome.value = Some(d);
            outcome.used_default = true;
        }
    }

    Ok(outcome)
}
