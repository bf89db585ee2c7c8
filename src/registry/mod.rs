//! Immutable registry of API-exposed resources, built once at startup.

mod descriptor;

pub use descriptor::{
    humanize, slugify, ColumnSpec, FieldCast, FieldDescriptor, PkType, ResourceDescriptor,
    SchemaField,
};

use std::collections::HashMap;

/// Maps URI slugs to resource descriptors. Constructed once during process
/// initialization and shared read-only across requests.
#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    by_slug: HashMap<String, ResourceDescriptor>,
    slugs: Vec<String>,
}

impl ResourceRegistry {
    /// Build the registry from declared descriptors. A malformed descriptor
    /// (no fields, or a slug already taken) is logged and skipped so the
    /// remaining resources still register.
    pub fn build(descriptors: Vec<ResourceDescriptor>) -> Self {
        let mut by_slug = HashMap::new();
        let mut slugs = Vec::new();
        for desc in descriptors {
            if desc.fields.is_empty() {
                tracing::warn!(resource = %desc.name, "skipping resource with no fields");
                continue;
            }
            if by_slug.contains_key(&desc.slug) {
                tracing::warn!(resource = %desc.name, slug = %desc.slug, "skipping resource with duplicate slug");
                continue;
            }
            slugs.push(desc.slug.clone());
            by_slug.insert(desc.slug.clone(), desc);
        }
        ResourceRegistry { by_slug, slugs }
    }

    pub fn get(&self, slug: &str) -> Option<&ResourceDescriptor> {
        self.by_slug.get(slug)
    }

    /// Registered slugs in registration order.
    pub fn slugs(&self) -> &[String] {
        &self.slugs
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ResourceDescriptor {
        ResourceDescriptor::new("Product", "products").field(FieldDescriptor::new("name"))
    }

    #[test]
    fn resolves_by_derived_slug() {
        let registry = ResourceRegistry::build(vec![product()]);
        assert!(registry.get("products").is_some());
        assert!(registry.get("orders").is_none());
    }

    #[test]
    fn duplicate_slug_is_skipped_not_fatal() {
        let dup = ResourceDescriptor::new("Products", "products_v2")
            .uri("products")
            .field(FieldDescriptor::new("name"));
        let registry = ResourceRegistry::build(vec![product(), dup]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("products").unwrap().table, "products");
    }

    #[test]
    fn fieldless_descriptor_is_skipped() {
        let empty = ResourceDescriptor::new("Ghost", "ghosts");
        let registry = ResourceRegistry::build(vec![empty, product()]);
        assert_eq!(registry.slugs(), &["products".to_string()]);
    }
}
