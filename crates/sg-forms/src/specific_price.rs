//! Specific price impact
//!
//! A specific price either sets a fixed price or applies a reduction to the
//! initial price, never both. Which one is active decides which field is
//! disabled and which constraint group validates the submission.

use serde_json::{Map, Value as JsonValue};
use sg_core::ValidationErrors;

use crate::base::{Contract, ValidationResult};

/// Highest accepted percentage reduction
pub const MAX_ALLOWED_PERCENTAGE: f64 = 100.0;

/// Fixed price sentinel meaning "keep the initial price"
pub const INITIAL_PRICE: f64 = -1.0;

pub const FIXED_PRICE_FIELD: &str = "fixed_price_tax_excluded";
pub const FIXED_PRICE_SWITCH: &str = "disabling_switch_fixed_price_tax_excluded";
pub const REDUCTION_FIELD: &str = "reduction";

/// A submitted field: missing from the form, sent empty, or sent with a value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Submitted {
    #[default]
    Absent,
    Null,
    Value(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionType {
    Amount,
    Percentage,
}

impl ReductionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "amount" => Some(Self::Amount),
            "percentage" => Some(Self::Percentage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    pub kind: ReductionType,
    pub value: f64,
}

/// Submitted state of the price impact form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceImpactState {
    /// Fixed price checkbox, when the form rendered one
    pub fixed_price_switch: Option<bool>,
    pub fixed_price_tax_excluded: Submitted,
    pub reduction: Option<Reduction>,
}

/// Constraint set applied to a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactGroup {
    FixedPrice,
    Reduction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactField {
    Reduction,
    FixedPriceTaxExcluded,
}

impl ImpactField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reduction => REDUCTION_FIELD,
            Self::FixedPriceTaxExcluded => FIXED_PRICE_FIELD,
        }
    }
}

impl PriceImpactState {
    /// Read the state from submitted form data
    ///
    /// Keeps the difference between a missing fixed price and one sent
    /// empty. A malformed reduction is reported against `reduction`.
    pub fn from_form(data: &Map<String, JsonValue>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let fixed_price_switch = data.get(FIXED_PRICE_SWITCH).map(|v| v == &JsonValue::Bool(true));

        let fixed_price_tax_excluded = match data.get(FIXED_PRICE_FIELD) {
            None => Submitted::Absent,
            Some(JsonValue::Null) => Submitted::Null,
            Some(JsonValue::String(s)) => Submitted::Value(s.clone()),
            Some(other) => Submitted::Value(other.to_string()),
        };

        let reduction = match data.get(REDUCTION_FIELD) {
            None | Some(JsonValue::Null) => None,
            Some(raw) => match parse_reduction(raw) {
                Some(reduction) => Some(reduction),
                None => {
                    errors.add(REDUCTION_FIELD, "This value is not a valid reduction.");
                    None
                }
            },
        };

        errors.into_result().map(|_| Self {
            fixed_price_switch,
            fixed_price_tax_excluded,
            reduction,
        })
    }

    /// Whether the submission sets a fixed price
    ///
    /// The switch is trusted first. Without it, a missing fixed price means
    /// no fixed price, an empty one counts as 0, and the initial-price
    /// sentinel means the initial price is kept.
    pub fn uses_fixed_price(&self) -> bool {
        if let Some(switch) = self.fixed_price_switch {
            return switch;
        }

        match &self.fixed_price_tax_excluded {
            Submitted::Absent => false,
            Submitted::Null => true,
            Submitted::Value(raw) => !is_initial_price(raw),
        }
    }

    pub fn validation_group(&self) -> ImpactGroup {
        if self.uses_fixed_price() {
            ImpactGroup::FixedPrice
        } else {
            ImpactGroup::Reduction
        }
    }

    /// Fields not part of the active group are disabled
    pub fn is_disabled(&self, field: ImpactField) -> bool {
        let fixed = self.uses_fixed_price();
        match field {
            ImpactField::Reduction => fixed,
            ImpactField::FixedPriceTaxExcluded => !fixed,
        }
    }
}

fn is_initial_price(raw: &str) -> bool {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "0" } else { raw };
    raw.parse::<f64>().map(|v| v == INITIAL_PRICE).unwrap_or(false)
}

fn parse_reduction(raw: &JsonValue) -> Option<Reduction> {
    let kind = ReductionType::parse(raw.get("type")?.as_str()?)?;
    let value = match raw.get("value")? {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(Reduction { kind, value })
}

/// Validates only the constraint group selected by the submitted state
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificPriceImpactContract;

impl SpecificPriceImpactContract {
    fn validate_fixed_price(&self, value: &Submitted, errors: &mut ValidationErrors) {
        let raw = match value {
            Submitted::Value(raw) if !raw.trim().is_empty() => raw.trim(),
            _ => {
                errors.add(FIXED_PRICE_FIELD, "This value should not be blank.");
                return;
            }
        };

        match raw.parse::<f64>() {
            Ok(price) if !price.is_finite() => {
                errors.add(FIXED_PRICE_FIELD, "This value should be of type float.")
            }
            Ok(price) if price < 0.0 => {
                errors.add(FIXED_PRICE_FIELD, "This value should be either positive or zero.")
            }
            Ok(_) => {}
            Err(_) => errors.add(FIXED_PRICE_FIELD, "This value should be of type float."),
        }
    }

    fn validate_reduction(&self, reduction: Option<&Reduction>, errors: &mut ValidationErrors) {
        let Some(reduction) = reduction else {
            return;
        };

        match reduction.kind {
            ReductionType::Percentage
                if !(0.0..=MAX_ALLOWED_PERCENTAGE).contains(&reduction.value) =>
            {
                errors.add(
                    REDUCTION_FIELD,
                    format!(
                        "Reduction value \"{}\" is invalid. Allowed values from 0 to {}%",
                        reduction.value, MAX_ALLOWED_PERCENTAGE
                    ),
                );
            }
            ReductionType::Amount if reduction.value < 0.0 => {
                errors.add(
                    REDUCTION_FIELD,
                    format!(
                        "Reduction value \"{}\" is invalid. Value cannot be negative",
                        reduction.value
                    ),
                );
            }
            _ => {}
        }
    }
}

impl Contract<PriceImpactState> for SpecificPriceImpactContract {
    fn validate(&self, state: &PriceImpactState) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        match state.validation_group() {
            ImpactGroup::FixedPrice => {
                self.validate_fixed_price(&state.fixed_price_tax_excluded, &mut errors)
            }
            ImpactGroup::Reduction => self.validate_reduction(state.reduction.as_ref(), &mut errors),
        }

        errors.into_result()
    }
}
