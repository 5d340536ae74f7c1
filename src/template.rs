//! Template interpolation for configuration values
//!
//! Handles `{{ variable }}` interpolation in string settings such as
//! `schema_name` or `check_constraint`. Supports nested access like
//! `{{ model.table_name }}` and positional access like `{{ key_values.0 }}`.
//!
//! Available roots:
//! - `model` - the model's name, table and partitioning members
//! - `field_value` - the sole key value (single-key resolution only)
//! - `normalized_value` - `field_value` after the model's normalisation
//! - `key_values` - every key value, by position

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_]+)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Model members (`name`, `table_name`, `integer_field`, ...)
    pub model: Value,
    /// Sole key value being resolved
    pub field_value: Option<Value>,
    /// Normalised form of `field_value`
    pub normalized_value: Option<Value>,
    /// All key values, in `on_fields` order
    pub key_values: Vec<Value>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with model members
    pub fn with_model(model: Value) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    /// Set key values; a single key also becomes `field_value`
    pub fn set_key_values(&mut self, key_values: Vec<Value>) -> &mut Self {
        self.field_value = match key_values.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        self.key_values = key_values;
        self
    }

    /// Set the normalised key value
    pub fn set_normalized_value(&mut self, value: Value) -> &mut Self {
        self.normalized_value = Some(value);
        self
    }

    /// Get a value by path (e.g., "model.table_name")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts[0] {
            "model" => get_nested_value(&self.model, &parts[1..]),
            "field_value" if parts.len() == 1 => self.field_value.as_ref(),
            "normalized_value" if parts.len() == 1 => self.normalized_value.as_ref(),
            "key_values" => {
                let index: usize = parts.get(1)?.parse().ok()?;
                let value = self.key_values.get(index)?;
                get_nested_value(value, &parts[2..])
            }
            // Bare names fall back to model members
            _ => get_nested_value(&self.model, &parts),
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            Value::Array(items) => {
                current = items.get(part.parse::<usize>().ok()?)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut errors = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let full_match = &cap[0];
        let var_path = &cap[1];

        match ctx.get(var_path) {
            Some(value) => {
                let replacement = value_to_string(value);
                result = result.replace(full_match, &replacement);
            }
            None => {
                errors.push(var_path.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Check that every variable a template uses has a known root
pub fn validate(template: &str) -> Result<()> {
    const ROOTS: [&str; 4] = ["model", "field_value", "normalized_value", "key_values"];

    for var in extract_variables(template) {
        let root = var.split('.').next().unwrap_or_default();
        if !ROOTS.contains(&root) {
            return Err(Error::template(format!(
                "unknown variable '{var}' in '{template}' (expected one of: {})",
                ROOTS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For complex types, use JSON serialization
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_substitution() {
        let ctx = TemplateContext::with_model(json!({
            "table_name": "employees"
        }));

        let result = render("{{ model.table_name }}_partitions", &ctx).unwrap();
        assert_eq!(result, "employees_partitions");
    }

    #[test]
    fn test_field_value_for_single_key() {
        let mut ctx = TemplateContext::new();
        ctx.set_key_values(vec![json!(1)]);

        let result = render("company_id = {{ field_value }}", &ctx).unwrap();
        assert_eq!(result, "company_id = 1");
    }

    #[test]
    fn test_field_value_undefined_for_many_keys() {
        let mut ctx = TemplateContext::new();
        ctx.set_key_values(vec![json!(1), json!("2011-01-03")]);

        assert!(render("{{ field_value }}", &ctx).is_err());
        assert_eq!(
            render("{{ key_values.0 }}_{{ key_values.1 }}", &ctx).unwrap(),
            "1_2011-01-03"
        );
    }

    #[test]
    fn test_normalized_value() {
        let mut ctx = TemplateContext::with_model(json!({"table_name": "employees"}));
        ctx.set_key_values(vec![json!(10_000_042)]);
        ctx.set_normalized_value(json!(10_000_000));

        let result = render(
            "{{ model.table_name }}_child_{{ normalized_value }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(result, "employees_child_10000000");
    }

    #[test]
    fn test_bare_names_read_model() {
        let ctx = TemplateContext::with_model(json!({"integer_field": "id"}));
        assert_eq!(render("{{integer_field}} > 0", &ctx).unwrap(), "id > 0");
    }

    #[test]
    fn test_undefined_variable() {
        let ctx = TemplateContext::new();
        let result = render("{{ model.missing }}", &ctx);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("model.missing"));
    }

    #[test]
    fn test_no_templates() {
        let ctx = TemplateContext::new();
        let result = render("plain string without templates", &ctx).unwrap();
        assert_eq!(result, "plain string without templates");
    }

    #[test]
    fn test_has_templates() {
        assert!(has_templates("{{ model.table_name }}"));
        assert!(has_templates("prefix {{ field_value }} suffix"));
        assert!(!has_templates("no templates here"));
        assert!(!has_templates("{ not a template }"));
    }

    #[test]
    fn test_extract_variables() {
        let vars = extract_variables("{{ model.a }} and {{ key_values.1 }}");
        assert_eq!(vars, vec!["model.a", "key_values.1"]);
    }

    #[test]
    fn test_validate_roots() {
        assert!(validate("{{ model.table_name }}_{{ normalized_value }}").is_ok());
        assert!(validate("{{ config.api_key }}").is_err());
    }

    #[test]
    fn test_whitespace_in_template() {
        let ctx = TemplateContext::with_model(json!({"table_name": "t"}));

        assert_eq!(render("{{model.table_name}}", &ctx).unwrap(), "t");
        assert_eq!(render("{{ model.table_name }}", &ctx).unwrap(), "t");
        assert_eq!(render("{{  model.table_name  }}", &ctx).unwrap(), "t");
    }
}
