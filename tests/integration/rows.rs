//! List rows and single records

use anyhow::Result;
use panel_core::config::PanelConfig;
use panel_core::core::{PanelError, RequestContext, VisibilityContext};
use panel_core::field::{Cardinality, FieldConfig, FieldView, RelationshipView, ResourceSchema};
use panel_core::panel::Panel;
use panel_core::test_utils::{MemoryCollection, PinnedView, UppercaseView};
use serde_json::json;
use std::sync::Arc;

fn team_schema() -> Result<ResourceSchema> {
    let schema = ResourceSchema::new("teams")
        .with_field(FieldConfig::builder("name").view(FieldView::Custom(Arc::new(UppercaseView))).shared())?
        .with_field(
            FieldConfig::builder("members")
                .view(FieldView::Relationship(
                    RelationshipView::new("players", Cardinality::HasMany).foreign_key("team_id"),
                ))
                .auto_options()
                .shared(),
        )?
        .with_field(FieldConfig::builder("budget").view(FieldView::Number).hide_on(VisibilityContext::List).shared())?;
    Ok(schema)
}

fn panel_with_players(config: PanelConfig) -> Panel {
    let panel = Panel::new(config);
    panel.register_collection(Arc::new(MemoryCollection::new(
        "players",
        vec![
            json!({"id": 1, "name": "Ana", "team_id": null}),
            json!({"id": 2, "name": "Bo", "team_id": 10}),
            json!({"id": 3, "name": "Cy", "team_id": 20}),
        ],
    )));
    panel
}

#[tokio::test]
async fn test_rows_scope_options_per_row() -> Result<()> {
    let panel = panel_with_players(PanelConfig::default());
    let rows = panel
        .resolve_rows(
            &team_schema()?,
            vec![json!({"id": 20, "name": "reds", "budget": 9}), json!({"id": 10, "name": "blues", "budget": 4})],
            &RequestContext::new(VisibilityContext::List),
        )
        .await?;

    let first = rows[0].data().expect("row 0 resolved");
    let second = rows[1].data().expect("row 1 resolved");

    assert_eq!(first.get("name").unwrap().data, json!("REDS"));
    assert_eq!(first.get("members").unwrap().metadata.options, Some(vec![json!("Ana"), json!("Cy")]));
    assert_eq!(second.get("members").unwrap().metadata.options, Some(vec![json!("Ana"), json!("Bo")]));
    assert!(first.get("budget").is_none());
    Ok(())
}

#[tokio::test]
async fn test_many_rows_keep_input_order() -> Result<()> {
    let panel = panel_with_players(PanelConfig::from_toml_str("[mapper]\nmax_workers = 3\n")?);
    let items: Vec<_> = (0..200).map(|i| json!({"id": i, "name": format!("team-{i}")})).collect();

    let rows = panel.resolve_rows(&team_schema()?, items, &RequestContext::new(VisibilityContext::List)).await?;

    assert_eq!(rows.len(), 200);
    for (i, row) in rows.iter().enumerate() {
        let row = row.data().expect("row resolved");
        assert_eq!(row.id(), Some(i.to_string().as_str()));
        assert_eq!(row.get("name").unwrap().data, json!(format!("TEAM-{i}")));
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_related_collection_fails_rows_individually() -> Result<()> {
    let panel = Panel::default();
    let rows = panel
        .resolve_rows(&team_schema()?, vec![json!({"id": 1}), json!({"id": 2})], &RequestContext::new(VisibilityContext::List))
        .await?;

    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.error(), Some("Field 'members' references unknown resource 'players'"));
    }
    Ok(())
}

#[tokio::test]
async fn test_detail_record_includes_hidden_list_fields() -> Result<()> {
    let panel = panel_with_players(PanelConfig::default());
    let record = panel
        .resolve_record(
            &team_schema()?,
            &json!({"id": 10, "name": "blues", "budget": "1500"}),
            &RequestContext::new(VisibilityContext::Detail),
        )
        .await?;

    assert_eq!(record.get("budget").unwrap().data, json!(1500));
    assert_eq!(
        serde_json::to_value(&record)?["members"]["metadata"]["relationship"],
        json!({"resource": "players", "cardinality": "has_many"})
    );
    Ok(())
}

#[tokio::test]
async fn test_isolation_policy_from_config() -> Result<()> {
    let schema = ResourceSchema::new("pins")
        .with_field(FieldConfig::builder("pin").view(FieldView::Custom(Arc::new(PinnedView))).shared())?;
    let ctx = RequestContext::new(VisibilityContext::List);
    let items = || vec![json!({"id": 1, "pin": "a"}), json!({"id": 2, "pin": "b"})];

    let strict = Panel::new(PanelConfig::from_toml_str("[isolation]\npolicy = \"reject\"\n")?);
    let err = strict.resolve_rows(&schema, items(), &ctx).await.unwrap_err();
    assert!(matches!(err, PanelError::IsolationUnsupported { ref field } if field == "pin"));

    let lenient = Panel::default();
    let rows = lenient.resolve_rows(&schema, items(), &ctx).await?;
    let pins: Vec<_> = rows.iter().map(|r| r.data().unwrap().get("pin").unwrap().data.clone()).collect();
    assert_eq!(pins, vec![json!("a"), json!("b")]);
    Ok(())
}
