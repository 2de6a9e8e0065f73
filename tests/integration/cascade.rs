//! Dependent-field cascades through the request boundary

use anyhow::Result;
use panel_core::core::{PanelError, VisibilityContext};
use panel_core::field::{FieldConfig, FieldUpdate, ResourceSchema};
use panel_core::panel::Panel;
use panel_core::resolver::DependencyRequest;
use panel_core::test_utils::{address_schema, init_test_logging};
use serde_json::{Value, json};

fn request(value: Value) -> Result<DependencyRequest> {
    Ok(serde_json::from_value(value)?)
}

/// Country changes, city gets `"X"` from its update-only callback; every other
/// attribute stays unset.
#[test]
fn test_country_city_update_scenario() -> Result<()> {
    init_test_logging(None);
    let panel = Panel::default();

    let updates = panel.resolve_dependencies(
        &address_schema()?,
        request(json!({"form": {"country": "1"}, "changed": ["country"], "context": "update"}))?,
    )?;

    assert_eq!(serde_json::to_value(&updates)?, json!({"city": {"value": "X"}}));
    Ok(())
}

#[test]
fn test_edit_token_matches_update() -> Result<()> {
    let panel = Panel::default();
    let schema = address_schema()?;

    let edit = panel.resolve_dependencies(
        &schema,
        request(json!({"form": {"country": "1"}, "changed": ["country"], "context": "edit"}))?,
    )?;
    let update = panel.resolve_dependencies(
        &schema,
        request(json!({"form": {"country": "1"}, "changed": ["country"], "context": "update"}))?,
    )?;

    assert_eq!(edit, update);
    Ok(())
}

fn pricing_schema() -> Result<ResourceSchema> {
    let schema = ResourceSchema::new("orders")
        .with_field(FieldConfig::builder("quantity").shared())?
        .with_field(
            FieldConfig::builder("subtotal")
                .depends_on(["quantity"])
                .on_change(|_, form, _| {
                    let quantity = form.get("quantity").and_then(Value::as_i64).unwrap_or(0);
                    Ok(Some(FieldUpdate::new().with_value(quantity * 5)))
                })
                .shared(),
        )?
        .with_field(
            FieldConfig::builder("shipping")
                .depends_on(["subtotal"])
                .on_change(|_, form, _| {
                    let subtotal = form.get("subtotal").and_then(Value::as_i64).unwrap_or(0);
                    let free = subtotal >= 50;
                    Ok(Some(
                        FieldUpdate::new()
                            .with_value(if free { 0 } else { 7 })
                            .with_enabled(!free),
                    ))
                })
                .shared(),
        )?
        .with_field(FieldConfig::builder("notes").depends_on(["quantity"]).shared())?;
    Ok(schema)
}

#[test]
fn test_transitive_cascade_in_one_call() -> Result<()> {
    let panel = Panel::default();

    let updates = panel.resolve_dependencies(
        &pricing_schema()?,
        request(json!({
            "form": {"fields": [{"key": "quantity", "type": "number", "data": 12}], "meta": {"page": 1}},
            "changed": ["quantity"],
            "context": "create"
        }))?,
    )?;

    assert_eq!(
        serde_json::to_value(&updates)?,
        json!({
            "subtotal": {"value": 60},
            "shipping": {"value": 0, "enabled": false}
        })
    );
    Ok(())
}

#[test]
fn test_cycle_is_reported_with_path() -> Result<()> {
    let schema = ResourceSchema::new("loop")
        .with_field(FieldConfig::builder("a").depends_on(["c"]).shared())?
        .with_field(FieldConfig::builder("b").depends_on(["a"]).shared())?
        .with_field(FieldConfig::builder("c").depends_on(["b"]).shared())?;

    let err = Panel::default()
        .resolve_dependencies(&schema, request(json!({"form": {}, "changed": ["a"], "context": "create"}))?)
        .unwrap_err();

    assert_eq!(err.to_string(), "Circular dependency detected: a → b → c → a");
    Ok(())
}

#[test]
fn test_fields_hidden_in_context_do_not_cascade() -> Result<()> {
    let schema = ResourceSchema::new("accounts")
        .with_field(FieldConfig::builder("plan").shared())?
        .with_field(
            FieldConfig::builder("seats")
                .depends_on(["plan"])
                .hide_on(VisibilityContext::Create)
                .on_change(|_, _, _| Ok(Some(FieldUpdate::new().with_visible(true))))
                .shared(),
        )?;

    let create = Panel::default().resolve_dependencies(
        &schema,
        request(json!({"form": {"plan": "pro"}, "changed": ["plan"], "context": "create"}))?,
    )?;
    assert!(create.is_empty());

    let update = Panel::default().resolve_dependencies(
        &schema,
        request(json!({"form": {"plan": "pro"}, "changed": ["plan"], "context": "edit", "record_id": "4"}))?,
    )?;
    assert_eq!(update["seats"].visible, Some(true));
    Ok(())
}

#[test]
fn test_malformed_form_rejected() -> Result<()> {
    let err = Panel::default()
        .resolve_dependencies(
            &address_schema()?,
            request(json!({"form": [1, 2], "changed": ["country"], "context": "update"}))?,
        )
        .unwrap_err();

    assert!(matches!(err, PanelError::InvalidFormData { .. }));
    Ok(())
}
