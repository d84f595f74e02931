use std::sync::atomic::{AtomicUsize, Ordering};

use facet_engine::{
    f, AttributeValue, Entity, ErrorKind, FacetError, FieldDecl, Fields, FromValue, IntoValue,
    ItemStore, KeyTuple, Mask, Record, Result, Table, TableConfig, TypedEntity, Value,
};
use facet_memory::MemoryItemStore;

const CONFIG: &str = r#"
name = "Facet"

[[indexes]]
name = "gsi1"
partition_key = "gsi1pk"
sort_key = "gsi1sk"
"#;

fn table() -> Table {
    Table::new(TableConfig::parse(CONFIG).unwrap()).unwrap()
}

fn store(table: &Table) -> MemoryItemStore {
    MemoryItemStore::new(table.keys().clone())
}

/// Users keyed by id, listed under their email in a sparse index.
fn user_entity(table: &Table) -> Entity {
    table
        .entity(
            "user",
            f::map([
                ("type", f::tag("user")),
                ("id", f::string().read_only()),
                ("name", f::string()),
                ("email", f::string().optional().read_only()),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| {
            Ok(KeyTuple::new(format!("user#{}", e.str("id")?), "user"))
        })
        .index("gsi1", Mask::new().select("email").select("type"), |e| {
            let kind = e.str("type")?;
            Ok(e.opt_str("email").map(|email| KeyTuple::new(format!("email#{email}"), kind)))
        })
        .build()
        .unwrap()
}

#[test]
fn item_carries_data_and_key_attributes() {
    let table = table();
    let user = user_entity(&table);

    let item = user
        .to_item(&Value::map([
            ("id", Value::from("42")),
            ("name", Value::from("x")),
            ("email", Value::from("x@y.test")),
        ]))
        .unwrap();

    assert_eq!(item["pk"], AttributeValue::S("user#42".into()));
    assert_eq!(item["sk"], AttributeValue::S("user".into()));
    assert_eq!(item["gsi1pk"], AttributeValue::S("email#x@y.test".into()));
    assert_eq!(item["gsi1sk"], AttributeValue::S("user".into()));
    assert_eq!(item["type"], AttributeValue::S("user".into()));
}

#[test]
fn declined_index_leaves_no_index_attributes() {
    let table = table();
    let user = user_entity(&table);

    let item = user
        .to_item(&Value::map([("id", Value::from("1")), ("name", Value::from("x"))]))
        .unwrap();
    assert!(!item.contains_key("gsi1pk"));
    assert!(!item.contains_key("gsi1sk"));
}

#[test]
fn from_item_strips_key_attributes() {
    let table = table();
    let user = user_entity(&table);
    let value = Value::map([("id", Value::from("1")), ("name", Value::from("x"))]);

    let back = user.from_item(&user.to_item(&value).unwrap()).unwrap();
    assert_eq!(
        back,
        Value::map([
            ("id", Value::from("1")),
            ("name", Value::from("x")),
            ("type", Value::from("user")),
        ])
    );
}

#[test]
fn foreign_tag_is_rejected() {
    let table = table();
    let user = user_entity(&table);

    let err = user
        .to_item(&Value::map([
            ("type", Value::from("organisation")),
            ("id", Value::from("1")),
            ("name", Value::from("x")),
        ]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(err.path(), Some("user.type"));
}

#[tokio::test]
async fn sparse_index_query_through_the_memory_store() {
    let table = table();
    let user = user_entity(&table);
    let store = store(&table);

    user.put(
        &store,
        Value::map([
            ("id", Value::from("1")),
            ("name", Value::from("Ann")),
            ("email", Value::from("ann@x.test")),
        ]),
    )
    .await
    .unwrap();
    user.put(&store, Value::map([("id", Value::from("2")), ("name", Value::from("Bob"))]))
        .await
        .unwrap();

    let found = store.query_index("gsi1", "email#ann@x.test").await.unwrap();
    assert_eq!(found.len(), 1);
    let ann = user.from_item(&found[0]).unwrap();
    assert_eq!(ann.get("name"), Some(&Value::from("Ann")));

    let key = user
        .primary_key(&Value::map([("id", Value::from("2")), ("name", Value::from("Bob"))]))
        .unwrap();
    let bob = user.get(&store, &key).await.unwrap().unwrap();
    assert_eq!(bob.get("email"), None);

    assert!(user.delete(&store, &key).await.unwrap());
    assert!(user.get(&store, &key).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Async defaults
// ---------------------------------------------------------------------------

static PROVIDER_CALLS: AtomicUsize = AtomicUsize::new(0);

async fn next_sequence() -> Result<Value> {
    let n = PROVIDER_CALLS.fetch_add(1, Ordering::SeqCst) + 1;
    Ok(Value::from(format!("seq-{n}")))
}

async fn directory_offline() -> Result<Value> {
    Err(FacetError::Storage("directory offline".into()))
}

fn order_entity(table: &Table) -> Entity {
    table
        .entity(
            "order",
            f::map([
                ("type", f::tag("order")),
                ("id", f::string().read_only()),
                ("reference", f::string().default_async(next_sequence)),
                (
                    "shipping",
                    f::map([
                        ("carrier", f::string().default("post")),
                        ("tracking", f::string().default_async(next_sequence)),
                    ])
                    .optional(),
                ),
            ]),
        )
        .primary_key(Mask::new().select("type").select("id"), |e| {
            Ok(KeyTuple::new(format!("order#{}", e.str("id")?), e.str("type")?))
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn async_defaults_resolve_at_every_level() {
    let table = table();
    let order = order_entity(&table);

    let item = order
        .to_item_async(Value::map([
            ("id", Value::from("o1")),
            ("shipping", Value::map::<&str, _>([])),
        ]))
        .await
        .unwrap();

    assert!(item["reference"].as_s().unwrap().starts_with("seq-"));
    let shipping = item["shipping"].as_m().unwrap();
    assert_eq!(shipping["carrier"], AttributeValue::S("post".into()));
    assert!(shipping["tracking"].as_s().unwrap().starts_with("seq-"));
    assert_eq!(item["sk"], AttributeValue::S("order".into()));
}

#[tokio::test]
async fn provided_values_skip_the_async_provider() {
    let table = table();
    let order = order_entity(&table);

    let item = order
        .to_item_async(Value::map([
            ("id", Value::from("o2")),
            ("reference", Value::from("manual")),
        ]))
        .await
        .unwrap();
    assert_eq!(item["reference"], AttributeValue::S("manual".into()));
    assert!(!item.contains_key("shipping"));
}

#[test]
fn sync_conversion_refuses_async_providers() {
    let table = table();
    let order = order_entity(&table);

    let err = order
        .to_item(&Value::map([("id", Value::from("o3"))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Default);
    assert!(matches!(err.root_cause(), FacetError::AsyncDefault(field) if field == "reference"));
}

#[test]
fn key_lookup_ignores_async_defaults_outside_the_mask() {
    let table = table();
    let order = order_entity(&table);

    let key = order
        .primary_key(&Value::map([("id", Value::from("o9"))]))
        .unwrap();
    assert_eq!(key, KeyTuple::new("order#o9", "order"));

    let account = table
        .entity(
            "account",
            f::map([
                ("id", f::string().read_only()),
                ("joined", f::string().default_async(next_sequence)),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| Ok(KeyTuple::new(e.str("id")?, "account")))
        .build()
        .unwrap();
    let key = account
        .primary_key(&Value::map([("id", Value::from("1"))]))
        .unwrap();
    assert_eq!(key, KeyTuple::new("1", "account"));
}

#[test]
fn index_lookup_sees_selected_tag_default() {
    let table = table();
    let user = user_entity(&table);

    let key = user
        .index_key(
            "gsi1",
            &Value::map([("id", Value::from("1")), ("email", Value::from("a@b.test"))]),
        )
        .unwrap();
    assert_eq!(key, Some(KeyTuple::new("email#a@b.test", "user")));
}

#[tokio::test]
async fn failing_provider_names_its_field() {
    let table = table();
    let entity = table
        .entity(
            "account",
            f::map([
                ("id", f::string().read_only()),
                ("owner", f::string().default_async(directory_offline)),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| Ok(KeyTuple::new(e.str("id")?, "account")))
        .build()
        .unwrap();

    let err = entity
        .to_item_async(Value::map([("id", Value::from("a1"))]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Default);
    assert!(
        matches!(err.root_cause(), FacetError::DefaultProvider { field, .. } if field == "owner")
    );
}

// ---------------------------------------------------------------------------
// Typed entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Member {
    id: String,
    name: String,
    email: Option<String>,
}

impl IntoValue for Member {
    fn into_value(self) -> Value {
        Value::map([
            ("id", self.id.into_value()),
            ("name", self.name.into_value()),
            ("email", self.email.into_value()),
        ])
    }
}

impl FromValue for Member {
    fn from_value(value: Value) -> Result<Self> {
        let mut fields = Fields::new(value)?;
        Ok(Member {
            id: fields.take("id")?,
            name: fields.take("name")?,
            email: fields.take("email")?,
        })
    }
}

impl Record for Member {
    const FIELDS: &'static [FieldDecl] = &[
        FieldDecl::required("id"),
        FieldDecl::required("name"),
        FieldDecl::optional("email"),
    ];
}

fn member_entity(table: &Table, email: facet_engine::Attr) -> Entity {
    table
        .entity(
            "member",
            f::map([
                ("id", f::string().read_only()),
                ("name", f::string()),
                ("email", email),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| {
            Ok(KeyTuple::new(format!("member#{}", e.str("id")?), "member"))
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn typed_entity_round_trips_records() {
    let table = table();
    let members = TypedEntity::<Member>::new(member_entity(&table, f::string().optional())).unwrap();
    let store = store(&table);

    let ann = Member {
        id: "1".into(),
        name: "Ann".into(),
        email: None,
    };
    members.put(&store, ann.clone()).await.unwrap();

    let key = members.primary_key(ann.clone()).unwrap();
    assert_eq!(key, KeyTuple::new("member#1", "member"));
    assert_eq!(members.get(&store, &key).await.unwrap(), Some(ann));
}

#[test]
fn typed_entity_rejects_optionality_drift() {
    let table = table();
    let err = TypedEntity::<Member>::new(member_entity(&table, f::string())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.to_string().contains("email"));
}

#[test]
fn typed_entity_rejects_missing_fields() {
    let table = table();
    let entity = table
        .entity(
            "member",
            f::map([
                ("id", f::string().read_only()),
                ("name", f::string()),
                ("email", f::string().optional()),
                ("nickname", f::string().optional()),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| Ok(KeyTuple::new(e.str("id")?, "member")))
        .build()
        .unwrap();

    let err = TypedEntity::<Member>::new(entity).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.to_string().contains("nickname"));
}
