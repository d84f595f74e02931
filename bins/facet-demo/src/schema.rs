use chrono::Utc;

use facet_api::{KeyTuple, Result, Value};
use facet_engine::{f, Entity, Mask, Table};

/// Organisations: one item per org, keyed `org#<id>`.
pub fn organisation(table: &Table) -> Result<Entity> {
    table
        .entity(
            "organisation",
            f::map([
                ("type", f::tag("organisation")),
                ("id", f::string().read_only()),
                ("name", f::string()),
                ("plan", f::literal(["free", "pro", "enterprise"]).default("free")),
                ("created_at", f::date().default_with(|| Value::from(Utc::now()))),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| {
            Ok(KeyTuple::new(format!("org#{}", e.str("id")?), "organisation"))
        })
        .build()
}

/// Stand-in for a lookup against an external clock or directory service.
async fn joined_now() -> Result<Value> {
    Ok(Value::from(Utc::now()))
}

/// Users: keyed `user#<id>`, listed under their org through `gsi1` and
/// looked up by email through the sparse `gsi2`.
pub fn user(table: &Table) -> Result<Entity> {
    table
        .entity(
            "user",
            f::map([
                ("type", f::tag("user")),
                ("id", f::string().read_only()),
                ("org_id", f::string().read_only()),
                ("name", f::string()),
                ("email", f::string().optional().read_only()),
                ("role", f::literal(["member", "admin"]).default("member")),
                ("tags", f::string_set().optional()),
                ("joined_at", f::date().default_async(joined_now)),
            ]),
        )
        .primary_key(Mask::new().select("id"), |e| {
            Ok(KeyTuple::new(format!("user#{}", e.str("id")?), "user"))
        })
        .index("gsi1", Mask::new().select("org_id").select("id"), |e| {
            Ok(Some(KeyTuple::new(
                format!("org#{}", e.str("org_id")?),
                format!("user#{}", e.str("id")?),
            )))
        })
        .index("gsi2", Mask::new().select("email").select("type"), |e| {
            let kind = e.str("type")?;
            Ok(e.opt_str("email")
                .map(|email| KeyTuple::new(format!("email#{email}"), kind)))
        })
        .build()
}
