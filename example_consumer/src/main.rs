//! Example consumer: a separate Rust project that uses resource-gateway as a
//! dependency. Declares a few business resources and serves them under
//! /api/v1 behind a bearer token.
//!
//! Run from repo root: `cargo run -p example-consumer`

use resource_gateway::{
    common_routes_with_ready, resource_routes, AppState, ColumnSpec, FieldCast, FieldDescriptor,
    ResourceDescriptor, ResourceRegistry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

fn descriptors() -> Vec<ResourceDescriptor> {
    let product = ResourceDescriptor::new("Product", "products")
        .field(FieldDescriptor::new("name").required().sortable().searchable())
        .field(FieldDescriptor::new("sku").unique().searchable())
        .field(FieldDescriptor::new("description"))
        .field(FieldDescriptor::new("unit_price").sortable())
        .field(FieldDescriptor::new("stock_quantity").sortable())
        .field(FieldDescriptor::new("is_active").filterable())
        .field(FieldDescriptor::new("category_id").filterable())
        .field(FieldDescriptor::new("tags"))
        .field(FieldDescriptor::new("released_on").cast(FieldCast::Date))
        .field(FieldDescriptor::new("created_at").cast(FieldCast::DateTime).readonly().sortable())
        .field(FieldDescriptor::new("updated_at").cast(FieldCast::DateTime).readonly())
        .column(ColumnSpec::new("name", "Name").sortable())
        .column(ColumnSpec::new("sku", "SKU"))
        .column(ColumnSpec::new("unit_price", "Price").sortable())
        .column(ColumnSpec::new("stock_quantity", "Stock").sortable())
        .default_sort("name");

    let customer = ResourceDescriptor::new("Customer", "customers")
        .field(FieldDescriptor::new("name").required().sortable().searchable())
        .field(FieldDescriptor::new("email").unique().searchable())
        .field(FieldDescriptor::new("phone"))
        .field(FieldDescriptor::new("billing_address"))
        .field(FieldDescriptor::new("credit_amount"))
        .field(FieldDescriptor::new("created_at").cast(FieldCast::DateTime).readonly().sortable())
        .column(ColumnSpec::new("name", "Name").sortable())
        .column(ColumnSpec::new("email", "Email"));

    let user = ResourceDescriptor::new("User", "users")
        .field(FieldDescriptor::new("name").required().sortable().searchable())
        .field(FieldDescriptor::new("email").required().unique())
        .field(FieldDescriptor::new("password"))
        .field(FieldDescriptor::new("is_active").filterable())
        .field(FieldDescriptor::new("created_at").cast(FieldCast::DateTime).readonly());

    vec![product, customer, user]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("resource_gateway=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/gateway".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let registry = ResourceRegistry::build(descriptors());
    tracing::info!(resources = ?registry.slugs(), "registry built");

    let state = AppState {
        pool,
        registry: Arc::new(registry),
        api_token: std::env::var("API_TOKEN").ok(),
    };

    let app = axum::Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", resource_routes(state))
        .layer(RequestBodyLimitLayer::new(1024 * 1024));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
