use std::{cell::RefCell, rc::Rc};

use query_core::{FieldCatalog, FieldPolicy, SequentialIdGenerator};
use serde_json::json;
use shared::domain::{EditorKind, Node};

use super::*;

type Log = Rc<RefCell<Vec<QueryChange>>>;

fn recorder() -> (Log, impl ChangeListener + 'static) {
    let log: Log = Rc::default();
    let sink = Rc::clone(&log);
    (log, move |change: QueryChange| sink.borrow_mut().push(change))
}

fn fields() -> Vec<Field> {
    vec![Field::new("name", "Name"), Field::new("age", "Age")]
}

fn mount_with(settings: SessionSettings) -> (QuerySession, Log) {
    let (log, listener) = recorder();
    let session = QuerySession::builder(fields())
        .id_generator(SequentialIdGenerator::default())
        .settings(settings)
        .mount(listener);
    (session, log)
}

fn strict() -> SessionSettings {
    SessionSettings {
        addressing: AddressingMode::Strict,
        ..SessionSettings::default()
    }
}

#[test]
fn mount_synthesizes_empty_root_and_notifies_once() {
    let (session, log) = mount_with(SessionSettings::default());
    let root = session.snapshot();
    assert!(root.rules.is_empty());
    assert_eq!(root.id.as_str(), "g-1");
    assert_eq!(root.combinator, "and");
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].query, root);
    assert!(log.borrow()[0].changed_prop.is_none());
}

#[test]
fn mount_notification_can_be_suppressed() {
    let (_session, log) = mount_with(SessionSettings {
        notify_on_mount: false,
        ..SessionSettings::default()
    });
    assert!(log.borrow().is_empty());
}

#[test]
fn create_rule_uses_first_field_and_its_default_operator() {
    let (mut session, _log) = mount_with(SessionSettings::default());
    let rule = session.create_rule();
    assert_eq!(rule.field, "name");
    assert_eq!(rule.operator, "=");
    assert_eq!(rule.value, json!(""));
    assert!(rule.id.as_str().starts_with("r-"));
}

#[test]
fn create_rule_prefers_policy_preselected_field() {
    let (_log, listener) = recorder();
    let resolver = Resolver::new(FieldCatalog::new(fields()).with_default_field("age"));
    let mut session = QuerySession::builder(fields())
        .resolver(resolver)
        .mount(listener);
    assert_eq!(session.create_rule().field, "age");
}

#[test]
fn disabling_auto_select_prepends_placeholder_field() {
    let (mut session, _log) = mount_with(SessionSettings {
        auto_select_field: false,
        ..SessionSettings::default()
    });
    assert_eq!(session.fields()[0], Field::unselected());
    assert_eq!(session.fields().len(), 3);
    assert_eq!(session.create_rule().field, "~");
}

#[test]
fn every_applied_mutation_notifies_once() {
    let (mut session, log) = mount_with(SessionSettings::default());
    let root_id = session.snapshot().id.clone();

    assert_eq!(session.add_rule_at_root(), Ok(Applied::Changed));
    let group = session.create_group();
    let group_id = group.id.clone();
    assert_eq!(session.add_group(group, &root_id), Ok(Applied::Changed));
    assert_eq!(session.clear_all(), Ok(Applied::Changed));

    assert_eq!(log.borrow().len(), 4);
    assert!(session.snapshot().rules.is_empty());
    assert_eq!(session.snapshot().id, root_id);
    assert!(!session.snapshot().rules.iter().any(|n| n.id() == &group_id));
}

#[test]
fn silent_mode_turns_addressing_failures_into_no_ops() {
    let (mut session, log) = mount_with(SessionSettings::default());
    let before = session.snapshot();
    let missing = NodeId::from("missing");

    let rule = session.create_rule();
    assert_eq!(session.add_rule(rule, &missing), Ok(Applied::Unchanged));
    let group = session.create_group();
    assert_eq!(session.add_group(group, &missing), Ok(Applied::Unchanged));
    assert_eq!(session.remove_rule(&missing, &before.id), Ok(Applied::Unchanged));
    assert_eq!(session.remove_group(&missing, &missing), Ok(Applied::Unchanged));
    assert_eq!(
        session.change_property(Property::Value, json!(1), &missing),
        Ok(Applied::Unchanged)
    );
    assert_eq!(
        session.change_property_named("colour", json!("red"), &before.id),
        Ok(Applied::Unchanged)
    );

    assert_eq!(log.borrow().len(), 1, "only the mount notification");
    assert_eq!(session.snapshot(), before);
}

#[test]
fn hand_built_groups_must_be_empty_and_use_a_configured_combinator() {
    let (mut session, log) = mount_with(strict());
    let root_id = session.snapshot().id.clone();
    let before = session.snapshot();

    for combinator in ["", "xor"] {
        let group = GroupNode::new(NodeId::from("g-x"), combinator);
        assert_eq!(
            session.add_group(group, &root_id),
            Err(TreeError::InvalidValue {
                prop: Property::Combinator,
                expected: "a configured combinator",
            })
        );
    }

    let mut holder = GroupNode::new(NodeId::from("g-y"), "and");
    holder.rules.push(Node::from(GroupNode::new(NodeId::from("g-z"), "and")));
    assert_eq!(
        session.add_group(holder, &root_id),
        Err(TreeError::GroupNotEmpty(NodeId::from("g-y")))
    );

    assert_eq!(session.snapshot(), before);
    assert_eq!(log.borrow().len(), 1, "only the mount notification");
}

#[test]
fn silent_mode_ignores_malformed_groups() {
    let (mut session, log) = mount_with(SessionSettings::default());
    let root_id = session.snapshot().id.clone();

    let bad = GroupNode::new(NodeId::from("g-x"), "");
    assert_eq!(session.add_group(bad, &root_id), Ok(Applied::Unchanged));

    let good = session.create_group();
    assert_eq!(session.add_group(good, &root_id), Ok(Applied::Changed));
    let root = session.snapshot();
    assert_eq!(root.rules.len(), 1);
    let added = root.rules[0].as_group().expect("group");
    assert_eq!(added.combinator, "and");
    assert_eq!(added.rules.len(), 1);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn strict_mode_reports_addressing_failures() {
    let (mut session, log) = mount_with(strict());
    let missing = NodeId::from("missing");
    let rule = session.create_rule();
    assert_eq!(
        session.add_rule(rule, &missing),
        Err(TreeError::NodeNotFound(missing.clone()))
    );
    assert_eq!(
        session.change_property_named("colour", json!(1), &missing),
        Err(TreeError::UnknownProperty("colour".into()))
    );
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn change_property_notification_is_tagged() {
    let (mut session, log) = mount_with(SessionSettings::default());
    session.add_rule_at_root().expect("add");
    let rule_id = session.snapshot().rules[0].id().clone();

    assert_eq!(
        session.change_property_named("value", json!("bob"), &rule_id),
        Ok(Applied::Changed)
    );
    let log = log.borrow();
    let last = log.last().expect("notification");
    assert_eq!(last.changed_prop, Some(Property::Value));
    assert_eq!(last.changed_id.as_ref(), Some(&rule_id));
    assert_eq!(
        last.query.rules[0].as_rule().map(|rule| rule.value.clone()),
        Some(json!("bob"))
    );
}

#[test]
fn delivered_snapshots_never_change_afterwards() {
    let (mut session, log) = mount_with(SessionSettings::default());
    session.add_rule_at_root().expect("add");
    let delivered = log.borrow().last().expect("change").query.clone();
    let rule_id = delivered.rules[0].id().clone();

    session
        .change_property(Property::Value, json!("later"), &rule_id)
        .expect("change");
    session.clear_all().expect("clear");

    assert_eq!(
        delivered.rules[0].as_rule().map(|rule| rule.value.clone()),
        Some(json!(""))
    );
}

#[test]
fn generated_ids_skip_ids_already_in_the_tree() {
    let (log, listener) = recorder();
    let query: RawGroup = serde_json::from_value(json!({
        "id": "g-1",
        "combinator": "and",
        "rules": [{"id": "r-1", "field": "name", "operator": "=", "value": ""}]
    }))
    .expect("raw");
    let mut session = QuerySession::builder(fields())
        .id_generator(SequentialIdGenerator::default())
        .query(query)
        .mount(listener);
    session.add_rule_at_root().expect("add");

    let ids: Vec<String> = session
        .snapshot()
        .rules
        .iter()
        .map(|n| n.id().to_string())
        .collect();
    assert_eq!(ids, ["r-1", "r-2"]);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn replace_query_readopts_without_notifying() {
    let (mut session, log) = mount_with(SessionSettings::default());
    let query: RawGroup = serde_json::from_value(json!({
        "id": "root-2",
        "combinator": "or",
        "rules": [
            {"id": "a", "field": "age", "operator": ">", "value": 3},
            {"id": "g", "combinator": "and", "rules": []}
        ]
    }))
    .expect("raw");
    session.replace_query(&query);

    let root = session.snapshot();
    assert_eq!(root.id.as_str(), "root-2");
    assert_eq!(root.combinator, "or");
    assert_eq!(root.rules.len(), 1);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn normal_view_projects_root_rules_only() {
    let (mut session, _log) = mount_with(SessionSettings {
        enable_normal_view: true,
        ..SessionSettings::default()
    });
    assert!(session.has_no_rules_applied());

    let root_id = session.snapshot().id.clone();
    let group = session.create_group();
    session.add_group(group, &root_id).expect("group");
    assert!(session.has_no_rules_applied());

    session.add_rule_at_root().expect("rule");
    let view = session.view();
    assert_eq!(view.rules.len(), 1);
    assert!(view.rules.iter().all(|n| matches!(n, Node::Rule(_))));
    assert_eq!(session.snapshot().rules.len(), 2, "full tree keeps the group");
    assert!(!session.has_no_rules_applied());
}

#[test]
fn full_view_is_the_snapshot() {
    let (mut session, _log) = mount_with(SessionSettings::default());
    session.add_rule_at_root().expect("rule");
    assert_eq!(session.view(), session.snapshot());
    assert!(!session.has_no_rules_applied());
}

#[test]
fn schema_exposes_resolved_answers_and_levels() {
    struct Flags;
    impl FieldPolicy for Flags {
        fn editor_kind(&self, field: &str, _operator: &str) -> Option<EditorKind> {
            (field == "active").then_some(EditorKind::Checkbox)
        }
        fn placeholder(&self, _field: &str, _operator: &str) -> Option<String> {
            Some("type here".into())
        }
    }

    let (_log, listener) = recorder();
    let mut session = QuerySession::builder(fields())
        .resolver(Resolver::new(Flags))
        .id_generator(SequentialIdGenerator::default())
        .mount(listener);
    let root_id = session.snapshot().id.clone();
    let group = session.create_group();
    let group_id = group.id.clone();
    session.add_group(group, &root_id).expect("group");

    let schema = session.schema();
    assert_eq!(schema.fields().len(), 2);
    assert_eq!(schema.combinators()[1].name, "or");
    assert!(schema.display().show_add_group);
    assert_eq!(schema.editor_kind("active", "="), EditorKind::Checkbox);
    assert_eq!(schema.input_type("active", "="), "text");
    assert_eq!(schema.placeholder("name", "="), "type here");
    assert!(schema.values("name", "=").is_empty());
    assert_eq!(schema.operators("name")[0].name, "=");
    assert_eq!(schema.level_of(&root_id), Some(0));
    assert_eq!(schema.level_of(&group_id), Some(1));
    assert_eq!(schema.level_of(&NodeId::from("nope")), None);
    let root = session.snapshot();
    assert!(schema.is_group(&root.rules[0]));
}
