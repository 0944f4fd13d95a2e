use crate::dynamodb::attribute_value::Item;

use aws_sdk_dynamodb::types;
use std::collections;

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// Expression text with its name and value placeholders.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    /// `#n<index>` standing for `attribute`.
    pub(crate) fn name(attribute: &str, index: usize) -> Self {
        let placeholder = format!("#n{index}");
        Self {
            expression: placeholder.clone(),
            expression_attribute_names: collections::HashMap::from([(
                placeholder,
                attribute.to_string(),
            )]),
            ..Default::default()
        }
    }

    /// `#n<index> = :v<index>`.
    pub(crate) fn assign(attribute: &str, index: usize, value: types::AttributeValue) -> Self {
        let mut operation = Self::name(attribute, index);
        let value_placeholder = format!(":v{index}");
        operation.expression = format!("{} = {value_placeholder}", operation.expression);
        operation
            .expression_attribute_values
            .insert(value_placeholder, value);
        operation
    }

    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        if !self.expression_attribute_names.is_empty() {
            names
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.expression_attribute_names);
        }
        if !self.expression_attribute_values.is_empty() {
            values
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.expression_attribute_values);
        }
        self.expression
    }
}

/// Projection over top-level attributes, in the given order.
pub(crate) fn projection(attributes: &[String]) -> ExpressionInput {
    let names = attributes
        .iter()
        .enumerate()
        .map(|(index, attribute)| ExpressionInput::name(attribute, index))
        .collect();
    ExpressionInput::merge(", ", names)
}

/// `SET` clause assigning every attribute of `updates`, ordered by attribute name.
pub(crate) fn set(updates: Item) -> ExpressionInput {
    let sorted: collections::BTreeMap<_, _> = updates.into_iter().collect();
    let assignments = sorted
        .into_iter()
        .enumerate()
        .map(|(index, (attribute, value))| ExpressionInput::assign(&attribute, index, value))
        .collect();
    let mut operation = ExpressionInput::merge(", ", assignments);
    if !operation.expression.is_empty() {
        operation.expression = format!("SET {}", operation.expression);
    }
    operation
}
