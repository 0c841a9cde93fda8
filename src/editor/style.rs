//! Conditional style chains per column.
//!
//! Rules are evaluated in order and the first match wins, so a `DEFAULT`
//! rule can only ever be the last one.

use crate::editor::fields::in_field_order;
use crate::error::{Error, Result};
use crate::model::bucket::ColumnKey;
use crate::model::draft::DraftReportState;
use crate::model::field::FieldKey;
use crate::model::style::{StyleOperator, StyleRule, StyleValue};

/// Set the CSS class of rule `index`, creating the rule when `index` is one
/// past the end of the chain. A blank class deletes the rule.
pub fn set_style_class(
    state: &mut DraftReportState,
    column: &FieldKey,
    index: usize,
    class: Option<&str>,
) -> Result<()> {
    if !in_field_order(state, column) {
        return Err(Error::UnknownField(column.encode()));
    }
    let info = state.column_info(column);
    let key = ColumnKey::plain(column.clone());
    let class = class.map(str::trim).filter(|c| !c.is_empty());

    let Some(class) = class else {
        let rules = state
            .col_options
            .get_mut(&key)
            .map(|options| &mut options.style)
            .filter(|rules| index < rules.len())
            .ok_or_else(|| unknown_rule(column, index))?;
        rules.remove(index);
        state.col_options.retain(|_, options| !options.is_empty());
        return Ok(());
    };

    let rules = &mut state.col_options.entry(key).or_default().style;
    if let Some(rule) = rules.get_mut(index) {
        rule.css_class = class.to_string();
        return Ok(());
    }
    if index > rules.len() {
        state.col_options.retain(|_, options| !options.is_empty());
        return Err(unknown_rule(column, index));
    }
    if rules
        .last()
        .is_some_and(|rule| rule.operator == StyleOperator::Default)
    {
        state.col_options.retain(|_, options| !options.is_empty());
        return Err(Error::StyleChainClosed {
            column: column.encode(),
        });
    }
    rules.push(StyleRule::new(class, info.data_type, &info.units));
    Ok(())
}

/// Change the operator of rule `index`.
///
/// `DEFAULT` drops the value and every later rule; presence tests drop the
/// value; other operators get the column type's default value when none is
/// set or the value is blank.
pub fn set_style_operator(
    state: &mut DraftReportState,
    column: &FieldKey,
    index: usize,
    operator: StyleOperator,
) -> Result<()> {
    let data_type = state.column_info(column).data_type;
    let rules = rules_mut(state, column, index)?;
    let rule = &mut rules[index];
    rule.operator = operator;
    match operator {
        StyleOperator::Default => {
            rule.value = None;
            rules.truncate(index + 1);
        }
        op if op.is_valueless() => rule.value = None,
        _ => {
            if rule.value.as_ref().map_or(true, StyleValue::is_blank) {
                rule.value = Some(StyleValue::default_for(data_type));
            }
        }
    }
    Ok(())
}

pub fn set_style_value(
    state: &mut DraftReportState,
    column: &FieldKey,
    index: usize,
    value: Option<StyleValue>,
) -> Result<()> {
    let rules = rules_mut(state, column, index)?;
    rules[index].value = value;
    Ok(())
}

pub fn set_style_suffix(
    state: &mut DraftReportState,
    column: &FieldKey,
    index: usize,
    suffix: Option<String>,
) -> Result<()> {
    let rules = rules_mut(state, column, index)?;
    rules[index].value_suffix = suffix.filter(|s| !s.is_empty());
    Ok(())
}

fn rules_mut<'a>(
    state: &'a mut DraftReportState,
    column: &FieldKey,
    index: usize,
) -> Result<&'a mut Vec<StyleRule>> {
    state
        .col_options
        .get_mut(&ColumnKey::plain(column.clone()))
        .map(|options| &mut options.style)
        .filter(|rules| index < rules.len())
        .ok_or_else(|| unknown_rule(column, index))
}

fn unknown_rule(column: &FieldKey, index: usize) -> Error {
    Error::UnknownStyleRule {
        column: column.encode(),
        index,
    }
}
