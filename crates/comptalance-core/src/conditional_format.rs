//! Conditional formatting rules
//!
//! A rule names the ranges it watches, a condition, and the
//! [`DifferentialStyle`] overlaid on matching cells. Formula operands are
//! kept as written in the file (no leading `=`), so a template's rules go
//! back out unchanged.

use crate::cell::CellRange;
use crate::style::{Color, DifferentialStyle};
use crate::validation::ComparisonOperator;

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormatRule {
    pub ranges: Vec<CellRange>,
    pub rule_type: CfRuleType,
    /// Evaluation order across the sheet, 1 first
    pub priority: u32,
    pub stop_if_true: bool,
    pub format: Option<DifferentialStyle>,
    /// `<formula>` operands in document order
    pub formulas: Vec<String>,
}

impl ConditionalFormatRule {
    pub fn new(rule_type: CfRuleType) -> Self {
        Self {
            ranges: Vec::new(),
            rule_type,
            priority: 1,
            stop_if_true: false,
            format: None,
            formulas: Vec::new(),
        }
    }

    /// `cellIs` rule comparing each cell against `formula`
    pub fn cell_is(operator: ComparisonOperator, formula: impl Into<String>) -> Self {
        let mut rule = Self::new(CfRuleType::CellIs { operator });
        rule.formulas.push(formula.into());
        rule
    }

    /// Rule matching wherever `formula` evaluates to true
    pub fn expression(formula: impl Into<String>) -> Self {
        let mut rule = Self::new(CfRuleType::Expression);
        rule.formulas.push(formula.into());
        rule
    }

    pub fn with_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn with_format(mut self, format: DifferentialStyle) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn applies_to(&self, row: u32, col: u16) -> bool {
        let addr = crate::CellAddress::new(row, col);
        self.ranges.iter().any(|r| r.contains(&addr))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CfRuleType {
    CellIs {
        operator: ComparisonOperator,
    },
    Expression,
    ColorScale {
        colors: Vec<CfColorValue>,
    },
    DataBar {
        min: CfValue,
        max: CfValue,
        color: Color,
        show_value: bool,
    },
    IconSet {
        /// Set name as stored, e.g. "3Arrows"
        icon_set: String,
        values: Vec<CfValue>,
        reverse: bool,
        show_value: bool,
    },
    Top10 {
        rank: u32,
        percent: bool,
        bottom: bool,
    },
    AboveAverage {
        above: bool,
        equal_average: bool,
        std_dev: Option<u32>,
    },
    Text {
        operator: TextOperator,
        text: String,
    },
    DuplicateValues,
    UniqueValues,
    ContainsBlanks,
    NotContainsBlanks,
    ContainsErrors,
    NotContainsErrors,
    TimePeriod {
        /// e.g. "today", "lastMonth"
        period: String,
    },
}

impl CfRuleType {
    /// Value of `cfRule/@type`
    pub fn xlsx_type(&self) -> &'static str {
        match self {
            CfRuleType::CellIs { .. } => "cellIs",
            CfRuleType::Expression => "expression",
            CfRuleType::ColorScale { .. } => "colorScale",
            CfRuleType::DataBar { .. } => "dataBar",
            CfRuleType::IconSet { .. } => "iconSet",
            CfRuleType::Top10 { .. } => "top10",
            CfRuleType::AboveAverage { .. } => "aboveAverage",
            CfRuleType::Text { operator, .. } => operator.xlsx_type(),
            CfRuleType::DuplicateValues => "duplicateValues",
            CfRuleType::UniqueValues => "uniqueValues",
            CfRuleType::ContainsBlanks => "containsBlanks",
            CfRuleType::NotContainsBlanks => "notContainsBlanks",
            CfRuleType::ContainsErrors => "containsErrors",
            CfRuleType::NotContainsErrors => "notContainsErrors",
            CfRuleType::TimePeriod { .. } => "timePeriod",
        }
    }

    /// Rule kinds that never carry a differential format
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            CfRuleType::ColorScale { .. } | CfRuleType::DataBar { .. } | CfRuleType::IconSet { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOperator {
    Contains,
    NotContains,
    BeginsWith,
    EndsWith,
}

impl TextOperator {
    const ALL: [(TextOperator, &'static str, &'static str); 4] = [
        (TextOperator::Contains, "containsText", "containsText"),
        (TextOperator::NotContains, "notContainsText", "notContains"),
        (TextOperator::BeginsWith, "beginsWith", "beginsWith"),
        (TextOperator::EndsWith, "endsWith", "endsWith"),
    ];

    /// `cfRule/@type` for this operator
    pub fn xlsx_type(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(op, _, _)| op == self)
            .map_or("containsText", |(_, ty, _)| ty)
    }

    /// `cfRule/@operator` for this operator
    pub fn xlsx_operator(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(op, _, _)| op == self)
            .map_or("containsText", |(_, _, op)| op)
    }

    /// From a `cfRule/@type` value
    pub fn from_xlsx_type(s: &str) -> Option<Self> {
        Self::ALL.iter().find(|(_, ty, _)| *ty == s).map(|(op, _, _)| *op)
    }
}

/// A threshold of a color scale, data bar or icon set (`<cfvo>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfValue {
    pub value_type: CfValueType,
    pub value: Option<String>,
}

impl CfValue {
    pub fn new(value_type: CfValueType, value: Option<String>) -> Self {
        Self { value_type, value }
    }

    pub fn min() -> Self {
        Self::new(CfValueType::Min, None)
    }

    pub fn max() -> Self {
        Self::new(CfValueType::Max, None)
    }

    pub fn percentile(p: impl Into<String>) -> Self {
        Self::new(CfValueType::Percentile, Some(p.into()))
    }
}

/// A color scale stop: threshold plus the color shown there
#[derive(Debug, Clone, PartialEq)]
pub struct CfColorValue {
    pub value: CfValue,
    pub color: Color,
}

impl CfColorValue {
    pub fn new(value: CfValue, color: Color) -> Self {
        Self { value, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfValueType {
    Min,
    Max,
    Num,
    Percent,
    Percentile,
    Formula,
    AutoMin,
    AutoMax,
}

impl CfValueType {
    const ALL: [(CfValueType, &'static str); 8] = [
        (CfValueType::Min, "min"),
        (CfValueType::Max, "max"),
        (CfValueType::Num, "num"),
        (CfValueType::Percent, "percent"),
        (CfValueType::Percentile, "percentile"),
        (CfValueType::Formula, "formula"),
        (CfValueType::AutoMin, "autoMin"),
        (CfValueType::AutoMax, "autoMax"),
    ];

    pub fn xlsx_type(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(t, _)| t == self)
            .map_or("num", |(_, name)| name)
    }

    pub fn from_xlsx(s: &str) -> Option<Self> {
        Self::ALL.iter().find(|(_, name)| *name == s).map(|(t, _)| *t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_is_rule() {
        let rule = ConditionalFormatRule::cell_is(ComparisonOperator::LessThan, "0")
            .with_range(CellRange::parse("C2:D40").unwrap())
            .with_format(DifferentialStyle::new().font_color(Color::RED))
            .with_priority(2);

        assert_eq!(rule.rule_type.xlsx_type(), "cellIs");
        assert_eq!(rule.formulas, vec!["0"]);
        assert!(rule.applies_to(1, 2));
        assert!(!rule.applies_to(0, 2));
        assert!(!rule.rule_type.is_visual());
    }

    #[test]
    fn test_text_operator_names() {
        assert_eq!(TextOperator::NotContains.xlsx_type(), "notContainsText");
        assert_eq!(TextOperator::NotContains.xlsx_operator(), "notContains");
        assert_eq!(TextOperator::from_xlsx_type("beginsWith"), Some(TextOperator::BeginsWith));
        assert_eq!(TextOperator::from_xlsx_type("cellIs"), None);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(CfValueType::from_xlsx("autoMax"), Some(CfValueType::AutoMax));
        assert_eq!(CfValueType::Percentile.xlsx_type(), "percentile");
        assert_eq!(CfValueType::from_xlsx("median"), None);
    }
}
