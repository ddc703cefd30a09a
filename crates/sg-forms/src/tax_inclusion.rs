//! Tax inclusion choice for price inputs

use serde::{Deserialize, Serialize};

/// Whether an entered price includes taxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxInclusion {
    #[default]
    TaxExcluded,
    TaxIncluded,
}

/// CSS class of the form row holding the choice
pub const ROW_CLASS: &str = "js-include-tax-row";

impl TaxInclusion {
    pub const ALL: [TaxInclusion; 2] = [TaxInclusion::TaxExcluded, TaxInclusion::TaxIncluded];

    pub fn label(&self) -> &'static str {
        match self {
            Self::TaxExcluded => "Tax excluded",
            Self::TaxIncluded => "Tax included",
        }
    }

    pub fn includes_tax(&self) -> bool {
        matches!(self, Self::TaxIncluded)
    }

    /// Label -> value pairs, in display order; the field has no placeholder
    pub fn choices() -> Vec<(&'static str, TaxInclusion)> {
        Self::ALL.iter().map(|c| (c.label(), *c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices() {
        assert_eq!(
            TaxInclusion::choices(),
            vec![
                ("Tax excluded", TaxInclusion::TaxExcluded),
                ("Tax included", TaxInclusion::TaxIncluded),
            ]
        );
        assert!(TaxInclusion::TaxIncluded.includes_tax());
        assert!(!TaxInclusion::default().includes_tax());
    }

    #[test]
    fn test_serde_names() {
        let choice: TaxInclusion = serde_json::from_str(r#""tax_included""#).unwrap();
        assert_eq!(choice, TaxInclusion::TaxIncluded);
        assert_eq!(serde_json::to_string(&TaxInclusion::TaxExcluded).unwrap(), r#""tax_excluded""#);
    }
}
