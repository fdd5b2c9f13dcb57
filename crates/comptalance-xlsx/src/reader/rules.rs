//! `<conditionalFormatting>` and `<dataValidations>` blocks.
//!
//! Both parsers are entered on the opening tag and consume events up to the
//! matching end tag. Formula operands are kept verbatim.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::XlsxResult;
use crate::styles::parse_color;
use crate::xml::{attr_bool, attr_parse, attr_str, decode_excel_escapes};
use comptalance_core::style::{Color, DifferentialStyle};
use comptalance_core::{
    CellRange, CfColorValue, CfRuleType, CfValue, CfValueType, ComparisonOperator,
    ConditionalFormatRule, DataValidation, TextOperator, ValidationErrorStyle, ValidationType,
    Worksheet,
};

/// Default data bar fill when the file names none
const DATA_BAR_COLOR: Color = Color::rgb(0x63, 0x8E, 0xC6);

fn parse_sqref(e: &BytesStart<'_>, sheet: &str) -> Vec<CellRange> {
    let Some(sqref) = attr_str(e, b"sqref") else {
        return Vec::new();
    };
    match CellRange::parse_list(&sqref) {
        Ok(ranges) => ranges,
        Err(err) => {
            log::warn!("skipping sqref '{}' on sheet '{}': {}", sqref, sheet, err);
            Vec::new()
        }
    }
}

/// Visual rule children collected until `</colorScale>`, `</dataBar>` or `</iconSet>`
#[derive(Debug, Default)]
struct Thresholds {
    values: Vec<CfValue>,
    colors: Vec<Color>,
}

pub(crate) fn parse_conditional_formatting<R: BufRead>(
    xml: &mut Reader<R>,
    start: &BytesStart<'_>,
    dxfs: &[DifferentialStyle],
    worksheet: &mut Worksheet,
) -> XlsxResult<()> {
    let ranges = parse_sqref(start, worksheet.name());

    let mut buf = Vec::new();
    let mut rule: Option<ConditionalFormatRule> = None;
    let mut thresholds = Thresholds::default();
    let mut formula: Option<String> = None;

    loop {
        buf.clear();
        let (e, empty) = match xml.read_event_into(&mut buf)? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Text(t) => {
                if let Some(formula) = formula.as_mut() {
                    formula.push_str(&t.unescape()?);
                }
                continue;
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"conditionalFormatting" => break,
                    b"formula" => {
                        if let (Some(rule), Some(text)) = (rule.as_mut(), formula.take()) {
                            rule.formulas.push(decode_excel_escapes(&text).into_owned());
                        }
                    }
                    b"colorScale" | b"dataBar" | b"iconSet" => {
                        if let Some(rule) = rule.as_mut() {
                            finish_visual(&mut rule.rule_type, std::mem::take(&mut thresholds));
                        }
                    }
                    b"cfRule" => {
                        if let Some(rule) = rule.take() {
                            add_rule(worksheet, rule);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"cfRule" => {
                rule = parse_cf_rule(&e, &ranges, dxfs);
                thresholds = Thresholds::default();
                if empty {
                    if let Some(rule) = rule.take() {
                        add_rule(worksheet, rule);
                    }
                }
            }
            b"formula" if !empty => formula = Some(String::new()),
            b"dataBar" => {
                if let Some(CfRuleType::DataBar { show_value, .. }) =
                    rule.as_mut().map(|r| &mut r.rule_type)
                {
                    *show_value = attr_bool(&e, b"showValue").unwrap_or(true);
                }
            }
            b"iconSet" => {
                if let Some(CfRuleType::IconSet {
                    icon_set,
                    reverse,
                    show_value,
                    ..
                }) = rule.as_mut().map(|r| &mut r.rule_type)
                {
                    if let Some(name) = attr_str(&e, b"iconSet") {
                        *icon_set = name;
                    }
                    *reverse = attr_bool(&e, b"reverse").unwrap_or(false);
                    *show_value = attr_bool(&e, b"showValue").unwrap_or(true);
                }
            }
            b"cfvo" => {
                let value_type = attr_str(&e, b"type")
                    .as_deref()
                    .and_then(CfValueType::from_xlsx)
                    .unwrap_or(CfValueType::Num);
                thresholds
                    .values
                    .push(CfValue::new(value_type, attr_str(&e, b"val")));
            }
            b"color" => thresholds.colors.push(parse_color(&e)),
            _ => {}
        }
    }

    Ok(())
}

fn add_rule(worksheet: &mut Worksheet, rule: ConditionalFormatRule) {
    if rule.ranges.is_empty() {
        log::warn!(
            "conditional format on sheet '{}' has no range, skipped",
            worksheet.name()
        );
        return;
    }
    worksheet.add_conditional_format(rule);
}

fn finish_visual(rule_type: &mut CfRuleType, thresholds: Thresholds) {
    let Thresholds { values, colors } = thresholds;
    match rule_type {
        CfRuleType::ColorScale { colors: stops } => {
            *stops = values
                .into_iter()
                .zip(colors)
                .map(|(value, color)| CfColorValue::new(value, color))
                .collect();
        }
        CfRuleType::DataBar {
            min, max, color, ..
        } => {
            let mut values = values.into_iter();
            *min = values.next().unwrap_or_else(CfValue::min);
            *max = values.next().unwrap_or_else(CfValue::max);
            *color = colors.first().copied().unwrap_or(DATA_BAR_COLOR);
        }
        CfRuleType::IconSet { values: stops, .. } => *stops = values,
        _ => {}
    }
}

/// `None` for rule types this model does not know
fn parse_cf_rule(
    e: &BytesStart<'_>,
    ranges: &[CellRange],
    dxfs: &[DifferentialStyle],
) -> Option<ConditionalFormatRule> {
    let kind = attr_str(e, b"type").unwrap_or_default();
    let flag = |key: &[u8], default: bool| attr_bool(e, key).unwrap_or(default);

    let rule_type = match kind.as_str() {
        "cellIs" => CfRuleType::CellIs {
            operator: attr_str(e, b"operator")
                .as_deref()
                .and_then(ComparisonOperator::from_xlsx)
                .unwrap_or(ComparisonOperator::Equal),
        },
        "expression" => CfRuleType::Expression,
        "colorScale" => CfRuleType::ColorScale { colors: Vec::new() },
        "dataBar" => CfRuleType::DataBar {
            min: CfValue::min(),
            max: CfValue::max(),
            color: DATA_BAR_COLOR,
            show_value: true,
        },
        "iconSet" => CfRuleType::IconSet {
            icon_set: "3TrafficLights1".into(),
            values: Vec::new(),
            reverse: false,
            show_value: true,
        },
        "top10" => CfRuleType::Top10 {
            rank: attr_parse(e, b"rank").unwrap_or(10),
            percent: flag(b"percent", false),
            bottom: flag(b"bottom", false),
        },
        "aboveAverage" => CfRuleType::AboveAverage {
            above: flag(b"aboveAverage", true),
            equal_average: flag(b"equalAverage", false),
            std_dev: attr_parse(e, b"stdDev"),
        },
        "duplicateValues" => CfRuleType::DuplicateValues,
        "uniqueValues" => CfRuleType::UniqueValues,
        "containsBlanks" => CfRuleType::ContainsBlanks,
        "notContainsBlanks" => CfRuleType::NotContainsBlanks,
        "containsErrors" => CfRuleType::ContainsErrors,
        "notContainsErrors" => CfRuleType::NotContainsErrors,
        "timePeriod" => CfRuleType::TimePeriod {
            period: attr_str(e, b"timePeriod").unwrap_or_else(|| "today".into()),
        },
        other => match TextOperator::from_xlsx_type(other) {
            Some(operator) => CfRuleType::Text {
                operator,
                text: attr_str(e, b"text").unwrap_or_default(),
            },
            None => {
                log::warn!("unsupported conditional format type '{}', skipped", other);
                return None;
            }
        },
    };

    let format = attr_parse::<usize>(e, b"dxfId").and_then(|id| dxfs.get(id).cloned());

    Some(ConditionalFormatRule {
        ranges: ranges.to_vec(),
        rule_type,
        priority: attr_parse(e, b"priority").unwrap_or(1),
        stop_if_true: flag(b"stopIfTrue", false),
        format,
        formulas: Vec::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    First,
    Second,
}

pub(crate) fn parse_data_validations<R: BufRead>(
    xml: &mut Reader<R>,
    worksheet: &mut Worksheet,
) -> XlsxResult<()> {
    let mut buf = Vec::new();
    let mut validation: Option<DataValidation> = None;
    let mut operand: Option<Operand> = None;

    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"dataValidation" => validation = Some(parse_data_validation_attrs(&e, worksheet)),
                b"formula1" => operand = Some(Operand::First),
                b"formula2" => operand = Some(Operand::Second),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"dataValidation" => {
                add_validation(worksheet, parse_data_validation_attrs(&e, worksheet));
            }
            Event::Text(t) => {
                if let (Some(validation), Some(operand)) = (validation.as_mut(), operand) {
                    let slot = match operand {
                        Operand::First => &mut validation.formula1,
                        Operand::Second => &mut validation.formula2,
                    };
                    slot.get_or_insert_with(String::new)
                        .push_str(&decode_excel_escapes(&t.unescape()?));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"dataValidations" => break,
                b"formula1" | b"formula2" => operand = None,
                b"dataValidation" => {
                    if let Some(validation) = validation.take() {
                        add_validation(worksheet, validation);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn add_validation(worksheet: &mut Worksheet, validation: DataValidation) {
    if validation.ranges.is_empty() {
        log::warn!(
            "data validation on sheet '{}' has no range, skipped",
            worksheet.name()
        );
        return;
    }
    worksheet.add_data_validation(validation);
}

fn parse_data_validation_attrs(e: &BytesStart<'_>, worksheet: &Worksheet) -> DataValidation {
    DataValidation {
        validation_type: attr_str(e, b"type")
            .map(|t| ValidationType::from_xlsx(&t))
            .unwrap_or_default(),
        operator: attr_str(e, b"operator")
            .as_deref()
            .and_then(ComparisonOperator::from_xlsx)
            .unwrap_or_default(),
        formula1: None,
        formula2: None,
        ranges: parse_sqref(e, worksheet.name()),
        allow_blank: attr_bool(e, b"allowBlank").unwrap_or(false),
        // showDropDown="1" hides the in-cell arrow
        show_dropdown: !attr_bool(e, b"showDropDown").unwrap_or(false),
        show_input_message: attr_bool(e, b"showInputMessage").unwrap_or(false),
        input_title: attr_str(e, b"promptTitle"),
        input_message: attr_str(e, b"prompt"),
        show_error_alert: attr_bool(e, b"showErrorMessage").unwrap_or(false),
        error_style: attr_str(e, b"errorStyle")
            .map(|s| ValidationErrorStyle::from_xlsx(&s))
            .unwrap_or_default(),
        error_title: attr_str(e, b"errorTitle"),
        error_message: attr_str(e, b"error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Run `parse` over `xml` once its opening element has been consumed
    fn with_reader(xml: &str, parse: impl FnOnce(&mut Reader<&[u8]>, &BytesStart<'_>)) {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => {
                    let start = e.into_owned();
                    parse(&mut reader, &start);
                    return;
                }
                Event::Eof => panic!("no start element"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_cell_is_rule_with_dxf() {
        let dxfs = vec![DifferentialStyle::new().font_color(Color::RED)];
        let mut sheet = Worksheet::new("BAL N");
        with_reader(
            r#"<conditionalFormatting sqref="C2:C40 E2:E40"><cfRule type="cellIs" dxfId="0" priority="2" operator="lessThan"><formula>0</formula></cfRule></conditionalFormatting>"#,
            |reader, start| {
                parse_conditional_formatting(reader, start, &dxfs, &mut sheet).unwrap()
            },
        );

        let rules = sheet.conditional_formats();
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].rule_type,
            CfRuleType::CellIs {
                operator: ComparisonOperator::LessThan
            }
        );
        assert_eq!(rules[0].ranges.len(), 2);
        assert_eq!(rules[0].priority, 2);
        assert_eq!(rules[0].formulas, vec!["0"]);
        assert_eq!(rules[0].format, Some(dxfs[0].clone()));
    }

    #[test]
    fn test_visual_and_text_rules() {
        let mut sheet = Worksheet::new("S");
        with_reader(
            r#"<conditionalFormatting sqref="D2:D9">
  <cfRule type="colorScale" priority="1"><colorScale><cfvo type="min"/><cfvo type="percentile" val="50"/><cfvo type="max"/><color rgb="FFF8696B"/><color rgb="FFFFEB84"/><color rgb="FF63BE7B"/></colorScale></cfRule>
  <cfRule type="dataBar" priority="2"><dataBar showValue="0"><cfvo type="min"/><cfvo type="max"/><color rgb="FF5A8AC6"/></dataBar></cfRule>
  <cfRule type="iconSet" priority="3"><iconSet iconSet="3Arrows" reverse="1"><cfvo type="percent" val="0"/><cfvo type="percent" val="33"/><cfvo type="percent" val="67"/></iconSet></cfRule>
  <cfRule type="containsText" dxfId="7" priority="4" operator="containsText" text="Total"><formula>NOT(ISERROR(SEARCH("Total",D2)))</formula></cfRule>
  <cfRule type="somethingNew" priority="5"/>
</conditionalFormatting>"#,
            |reader, start| parse_conditional_formatting(reader, start, &[], &mut sheet).unwrap(),
        );

        let rules = sheet.conditional_formats();
        assert_eq!(rules.len(), 4);

        let CfRuleType::ColorScale { colors } = &rules[0].rule_type else {
            panic!("expected a color scale, got {:?}", rules[0].rule_type);
        };
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[1].value, CfValue::percentile("50"));
        assert_eq!(colors[2].color, Color::rgb(0x63, 0xBE, 0x7B));

        assert_eq!(
            rules[1].rule_type,
            CfRuleType::DataBar {
                min: CfValue::min(),
                max: CfValue::max(),
                color: Color::rgb(0x5A, 0x8A, 0xC6),
                show_value: false,
            }
        );

        let CfRuleType::IconSet {
            icon_set,
            values,
            reverse,
            show_value,
        } = &rules[2].rule_type
        else {
            panic!("expected an icon set");
        };
        assert_eq!(icon_set, "3Arrows");
        assert_eq!(values.len(), 3);
        assert!(*reverse);
        assert!(*show_value);

        // out-of-range dxfId leaves the rule without a format
        assert_eq!(rules[3].format, None);
        assert_eq!(
            rules[3].rule_type,
            CfRuleType::Text {
                operator: TextOperator::Contains,
                text: "Total".into()
            }
        );
        assert_eq!(rules[3].formulas, vec![r#"NOT(ISERROR(SEARCH("Total",D2)))"#]);
    }

    #[test]
    fn test_data_validations() {
        let mut sheet = Worksheet::new("BAL N");
        with_reader(
            r#"<dataValidations count="3">
  <dataValidation type="list" allowBlank="1" showInputMessage="1" showErrorMessage="1" sqref="E2:E50" promptTitle="Sens"><formula1>"Débit,Crédit"</formula1></dataValidation>
  <dataValidation type="decimal" operator="between" showDropDown="1" errorStyle="warning" error="Hors bornes" sqref="F2:F50"><formula1>0</formula1><formula2>1000000</formula2></dataValidation>
  <dataValidation type="whole" sqref="ZZZZ1"><formula1>1</formula1></dataValidation>
</dataValidations>"#,
            |reader, _| parse_data_validations(reader, &mut sheet).unwrap(),
        );

        let validations = sheet.data_validations();
        assert_eq!(validations.len(), 2);

        let list = &validations[0];
        assert_eq!(list.validation_type, ValidationType::List);
        assert_eq!(list.formula1.as_deref(), Some("\"Débit,Crédit\""));
        assert!(list.allow_blank);
        assert!(list.show_dropdown);
        assert!(list.show_error_alert);
        assert_eq!(list.input_title.as_deref(), Some("Sens"));

        let bounds = &validations[1];
        assert_eq!(bounds.validation_type, ValidationType::Decimal);
        assert_eq!(bounds.operator, ComparisonOperator::Between);
        assert_eq!(bounds.formula2.as_deref(), Some("1000000"));
        assert!(!bounds.show_dropdown);
        assert!(!bounds.show_error_alert);
        assert_eq!(bounds.error_style, ValidationErrorStyle::Warning);
        assert_eq!(bounds.error_message.as_deref(), Some("Hors bornes"));
    }
}
