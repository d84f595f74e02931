mod schema;

use clap::Parser;

use facet_api::{FacetError, ItemStore, Result, Value};
use facet_engine::{Table, TableConfig};
use facet_memory::MemoryItemStore;

#[derive(Parser)]
#[command(name = "facet-demo", about = "Convert JSON records into single-table items")]
struct Cli {
    /// Path to TOML table configuration.
    #[arg(long, default_value = "facet.toml", env = "FACET_CONFIG")]
    config: String,

    /// JSON file with `organisations` and `users` arrays.
    #[arg(long, default_value = "data.json", env = "FACET_INPUT")]
    input: String,

    /// Print each stored item in its wire JSON shape.
    #[arg(long)]
    print_items: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        tracing::error!(error = %e, "facet-demo failed");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    tracing::info!(config = %cli.config, "loading table configuration");
    let config = TableConfig::load(&cli.config)?;
    let store = MemoryItemStore::new(config.keys.clone());
    let table = Table::new(config)?;

    let organisation = schema::organisation(&table)?;
    let user = schema::user(&table)?;

    tracing::info!(input = %cli.input, "reading records");
    let content = std::fs::read_to_string(&cli.input)
        .map_err(|e| FacetError::Config(format!("{}: {e}", cli.input)))?;
    let input = Value::from_json(serde_json::from_str(&content)?);

    let mut org_ids = Vec::new();
    for record in records(&input, "organisations") {
        let item = organisation.put(&store, record.clone()).await?;
        if let Some(id) = record.get("id").and_then(Value::as_str) {
            org_ids.push(id.to_string());
        }
        print_item(cli, &item)?;
    }
    for record in records(&input, "users") {
        let item = user.put(&store, record.clone()).await?;
        print_item(cli, &item)?;
    }
    tracing::info!(items = store.len().await, table = %table.name(), "records stored");

    for org_id in &org_ids {
        let members = store.query_index("gsi1", &format!("org#{org_id}")).await?;
        let names: Vec<String> = members
            .iter()
            .map(|item| user.from_item(item))
            .collect::<Result<Vec<_>>>()?
            .iter()
            .filter_map(|u| u.get("name").and_then(Value::as_str).map(str::to_string))
            .collect();
        tracing::info!(org = %org_id, members = ?names, "organisation members");
    }

    let with_email = store.query_index("gsi2", "email#ann@acme.test").await?;
    tracing::info!(found = with_email.len(), "lookup by email");
    Ok(())
}

fn records<'a>(input: &'a Value, field: &str) -> impl Iterator<Item = &'a Value> {
    input.get(field).and_then(Value::as_list).unwrap_or_default().iter()
}

fn print_item(cli: &Cli, item: &facet_api::Item) -> Result<()> {
    if cli.print_items {
        println!("{}", serde_json::to_string(item)?);
    }
    Ok(())
}
