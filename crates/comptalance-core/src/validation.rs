//! Data validation
//!
//! Restricts what may be typed into a set of ranges: a dropdown list, a
//! numeric or date bound, a text length, or a custom formula. Operands are
//! stored as the formula text the file carries, so `"Oui,Non"` (a literal
//! list, quotes included) and `$H$2:$H$9` (a range) both survive.

use crate::cell::CellRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataValidation {
    pub validation_type: ValidationType,
    /// Only meaningful for the bounded kinds
    pub operator: ComparisonOperator,
    pub formula1: Option<String>,
    pub formula2: Option<String>,
    pub ranges: Vec<CellRange>,
    pub allow_blank: bool,
    /// In-cell dropdown for list validations
    pub show_dropdown: bool,

    pub show_input_message: bool,
    pub input_title: Option<String>,
    pub input_message: Option<String>,

    pub show_error_alert: bool,
    pub error_style: ValidationErrorStyle,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            validation_type: ValidationType::Any,
            operator: ComparisonOperator::Between,
            formula1: None,
            formula2: None,
            ranges: Vec::new(),
            allow_blank: true,
            show_dropdown: true,
            show_input_message: false,
            input_title: None,
            input_message: None,
            show_error_alert: true,
            error_style: ValidationErrorStyle::Stop,
            error_title: None,
            error_message: None,
        }
    }
}

impl DataValidation {
    pub fn new(validation_type: ValidationType) -> Self {
        Self {
            validation_type,
            ..Self::default()
        }
    }

    /// Dropdown of literal choices, e.g. `list(&["Oui", "Non"])`
    pub fn list(choices: &[&str]) -> Self {
        let mut validation = Self::new(ValidationType::List);
        validation.formula1 = Some(format!("\"{}\"", choices.join(",")));
        validation
    }

    /// Dropdown fed by a range, e.g. `$H$2:$H$9`
    pub fn list_from(source: impl Into<String>) -> Self {
        let mut validation = Self::new(ValidationType::List);
        validation.formula1 = Some(source.into());
        validation
    }

    pub fn decimal_between(min: impl Into<String>, max: impl Into<String>) -> Self {
        let mut validation = Self::new(ValidationType::Decimal);
        validation.formula1 = Some(min.into());
        validation.formula2 = Some(max.into());
        validation
    }

    pub fn custom(formula: impl Into<String>) -> Self {
        let mut validation = Self::new(ValidationType::Custom);
        validation.formula1 = Some(formula.into());
        validation
    }

    pub fn with_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn with_error_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.show_error_alert = true;
        self.error_title = Some(title.into());
        self.error_message = Some(message.into());
        self
    }

    pub fn applies_to(&self, row: u32, col: u16) -> bool {
        let addr = crate::CellAddress::new(row, col);
        self.ranges.iter().any(|r| r.contains(&addr))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationType {
    #[default]
    Any,
    Whole,
    Decimal,
    List,
    Date,
    Time,
    TextLength,
    Custom,
}

impl ValidationType {
    const ALL: [(ValidationType, &'static str); 8] = [
        (ValidationType::Any, "none"),
        (ValidationType::Whole, "whole"),
        (ValidationType::Decimal, "decimal"),
        (ValidationType::List, "list"),
        (ValidationType::Date, "date"),
        (ValidationType::Time, "time"),
        (ValidationType::TextLength, "textLength"),
        (ValidationType::Custom, "custom"),
    ];

    pub fn xlsx_type(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(t, _)| t == self)
            .map_or("none", |(_, name)| name)
    }

    pub fn from_xlsx(s: &str) -> Self {
        Self::ALL
            .iter()
            .find(|(_, name)| *name == s)
            .map_or(ValidationType::Any, |(t, _)| *t)
    }

    /// Kinds whose operands are compared with an operator
    pub fn uses_operator(&self) -> bool {
        matches!(
            self,
            ValidationType::Whole
                | ValidationType::Decimal
                | ValidationType::Date
                | ValidationType::Time
                | ValidationType::TextLength
        )
    }
}

/// Comparison shared by validations and `cellIs` conditional formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonOperator {
    #[default]
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ComparisonOperator {
    const ALL: [(ComparisonOperator, &'static str); 8] = [
        (ComparisonOperator::Between, "between"),
        (ComparisonOperator::NotBetween, "notBetween"),
        (ComparisonOperator::Equal, "equal"),
        (ComparisonOperator::NotEqual, "notEqual"),
        (ComparisonOperator::GreaterThan, "greaterThan"),
        (ComparisonOperator::LessThan, "lessThan"),
        (ComparisonOperator::GreaterThanOrEqual, "greaterThanOrEqual"),
        (ComparisonOperator::LessThanOrEqual, "lessThanOrEqual"),
    ];

    pub fn xlsx_operator(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(op, _)| op == self)
            .map_or("between", |(_, name)| name)
    }

    pub fn from_xlsx(s: &str) -> Option<Self> {
        Self::ALL.iter().find(|(_, name)| *name == s).map(|(op, _)| *op)
    }

    /// Operators taking two operands
    pub fn is_range(&self) -> bool {
        matches!(self, ComparisonOperator::Between | ComparisonOperator::NotBetween)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorStyle {
    #[default]
    Stop,
    Warning,
    Information,
}

impl ValidationErrorStyle {
    pub fn xlsx_style(&self) -> &'static str {
        match self {
            ValidationErrorStyle::Stop => "stop",
            ValidationErrorStyle::Warning => "warning",
            ValidationErrorStyle::Information => "information",
        }
    }

    pub fn from_xlsx(s: &str) -> Self {
        match s {
            "warning" => ValidationErrorStyle::Warning,
            "information" => ValidationErrorStyle::Information,
            _ => ValidationErrorStyle::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_list_keeps_quotes() {
        let validation = DataValidation::list(&["Oui", "Non"])
            .with_range(CellRange::parse("E2:E50").unwrap());

        assert_eq!(validation.validation_type, ValidationType::List);
        assert_eq!(validation.formula1.as_deref(), Some("\"Oui,Non\""));
        assert!(validation.applies_to(10, 4));
        assert!(!validation.applies_to(10, 5));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ValidationType::from_xlsx("textLength"), ValidationType::TextLength);
        assert_eq!(ValidationType::from_xlsx("bogus"), ValidationType::Any);
        assert_eq!(ValidationType::Any.xlsx_type(), "none");
        assert!(ValidationType::Decimal.uses_operator());
        assert!(!ValidationType::List.uses_operator());
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(
            ComparisonOperator::from_xlsx("greaterThanOrEqual"),
            Some(ComparisonOperator::GreaterThanOrEqual)
        );
        assert_eq!(ComparisonOperator::NotBetween.xlsx_operator(), "notBetween");
        assert!(ComparisonOperator::Between.is_range());
        assert!(!ComparisonOperator::Equal.is_range());
    }
}
