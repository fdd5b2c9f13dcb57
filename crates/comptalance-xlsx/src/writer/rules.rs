//! `<conditionalFormatting>` and `<dataValidations>` blocks of a worksheet part

use comptalance_core::{CellRange, CfRuleType, CfValue, ConditionalFormatRule, Worksheet};

use crate::styles::{color_attrs, XlsxStyleTable};
use crate::xml::{encode_excel_escapes, escape};

/// One `<conditionalFormatting>` per rule, in sheet order
pub(crate) fn write_conditional_formats(
    content: &mut String,
    sheet: &Worksheet,
    style_table: &XlsxStyleTable,
) {
    for rule in sheet.conditional_formats() {
        if rule.ranges.is_empty() {
            continue;
        }
        content.push_str(&format!(
            "\n    <conditionalFormatting sqref=\"{}\">",
            CellRange::format_list(&rule.ranges)
        ));
        write_cf_rule(content, rule, style_table);
        content.push_str("\n    </conditionalFormatting>");
    }
}

fn write_cf_rule(content: &mut String, rule: &ConditionalFormatRule, style_table: &XlsxStyleTable) {
    content.push_str(&format!("\n        <cfRule type=\"{}\"", rule.rule_type.xlsx_type()));
    if !rule.rule_type.is_visual() {
        if let Some(id) = rule.format.as_ref().and_then(|f| style_table.dxf_id_for(f)) {
            content.push_str(&format!(" dxfId=\"{}\"", id));
        }
    }
    content.push_str(&format!(" priority=\"{}\"", rule.priority));
    if rule.stop_if_true {
        content.push_str(" stopIfTrue=\"1\"");
    }

    match &rule.rule_type {
        CfRuleType::CellIs { operator } => {
            content.push_str(&format!(" operator=\"{}\"", operator.xlsx_operator()))
        }
        CfRuleType::Top10 {
            rank,
            percent,
            bottom,
        } => {
            if *percent {
                content.push_str(" percent=\"1\"");
            }
            if *bottom {
                content.push_str(" bottom=\"1\"");
            }
            content.push_str(&format!(" rank=\"{}\"", rank));
        }
        CfRuleType::AboveAverage {
            above,
            equal_average,
            std_dev,
        } => {
            if !above {
                content.push_str(" aboveAverage=\"0\"");
            }
            if *equal_average {
                content.push_str(" equalAverage=\"1\"");
            }
            if let Some(std_dev) = std_dev {
                content.push_str(&format!(" stdDev=\"{}\"", std_dev));
            }
        }
        CfRuleType::Text { operator, text } => content.push_str(&format!(
            " operator=\"{}\" text=\"{}\"",
            operator.xlsx_operator(),
            escape(text)
        )),
        CfRuleType::TimePeriod { period } => {
            content.push_str(&format!(" timePeriod=\"{}\"", escape(period)))
        }
        _ => {}
    }

    let visual = visual_child(&rule.rule_type);
    if rule.formulas.is_empty() && visual.is_none() {
        content.push_str("/>");
        return;
    }
    content.push('>');
    for formula in &rule.formulas {
        content.push_str(&format!(
            "<formula>{}</formula>",
            escape(&encode_excel_escapes(formula))
        ));
    }
    if let Some(visual) = visual {
        content.push_str(&visual);
    }
    content.push_str("</cfRule>");
}

fn cfvo(value: &CfValue) -> String {
    match &value.value {
        Some(val) => format!(
            "<cfvo type=\"{}\" val=\"{}\"/>",
            value.value_type.xlsx_type(),
            escape(val)
        ),
        None => format!("<cfvo type=\"{}\"/>", value.value_type.xlsx_type()),
    }
}

/// `<colorScale>`, `<dataBar>` or `<iconSet>`; thresholds come before colors
fn visual_child(rule_type: &CfRuleType) -> Option<String> {
    match rule_type {
        CfRuleType::ColorScale { colors } => {
            let mut s = String::from("<colorScale>");
            for stop in colors {
                s.push_str(&cfvo(&stop.value));
            }
            for stop in colors {
                s.push_str(&format!("<color{}/>", color_attrs(&stop.color)));
            }
            s.push_str("</colorScale>");
            Some(s)
        }
        CfRuleType::DataBar {
            min,
            max,
            color,
            show_value,
        } => Some(format!(
            "<dataBar{}>{}{}<color{}/></dataBar>",
            if *show_value { "" } else { " showValue=\"0\"" },
            cfvo(min),
            cfvo(max),
            color_attrs(color)
        )),
        CfRuleType::IconSet {
            icon_set,
            values,
            reverse,
            show_value,
        } => {
            let mut s = format!("<iconSet iconSet=\"{}\"", escape(icon_set));
            if !show_value {
                s.push_str(" showValue=\"0\"");
            }
            if *reverse {
                s.push_str(" reverse=\"1\"");
            }
            s.push('>');
            for value in values {
                s.push_str(&cfvo(value));
            }
            s.push_str("</iconSet>");
            Some(s)
        }
        _ => None,
    }
}

pub(crate) fn write_data_validations(content: &mut String, sheet: &Worksheet) {
    let validations: Vec<_> = sheet
        .data_validations()
        .iter()
        .filter(|v| !v.ranges.is_empty())
        .collect();
    if validations.is_empty() {
        return;
    }

    content.push_str(&format!(
        "\n    <dataValidations count=\"{}\">",
        validations.len()
    ));
    for validation in validations {
        content.push_str("\n        <dataValidation");
        if validation.validation_type != Default::default() {
            content.push_str(&format!(
                " type=\"{}\"",
                validation.validation_type.xlsx_type()
            ));
        }
        if validation.validation_type.uses_operator() {
            content.push_str(&format!(
                " operator=\"{}\"",
                validation.operator.xlsx_operator()
            ));
        }
        if validation.allow_blank {
            content.push_str(" allowBlank=\"1\"");
        }
        if !validation.show_dropdown {
            content.push_str(" showDropDown=\"1\"");
        }
        if validation.show_input_message {
            content.push_str(" showInputMessage=\"1\"");
        }
        if validation.show_error_alert {
            content.push_str(" showErrorMessage=\"1\"");
        }
        if validation.error_style != Default::default() {
            content.push_str(&format!(
                " errorStyle=\"{}\"",
                validation.error_style.xlsx_style()
            ));
        }
        let texts = [
            ("errorTitle", &validation.error_title),
            ("error", &validation.error_message),
            ("promptTitle", &validation.input_title),
            ("prompt", &validation.input_message),
        ];
        for (name, text) in texts {
            if let Some(text) = text {
                content.push_str(&format!(" {}=\"{}\"", name, escape(text)));
            }
        }
        content.push_str(&format!(
            " sqref=\"{}\">",
            CellRange::format_list(&validation.ranges)
        ));

        for (tag, formula) in [("formula1", &validation.formula1), ("formula2", &validation.formula2)] {
            if let Some(formula) = formula {
                content.push_str(&format!(
                    "<{tag}>{}</{tag}>",
                    escape(&encode_excel_escapes(formula))
                ));
            }
        }
        content.push_str("</dataValidation>");
    }
    content.push_str("\n    </dataValidations>");
}
