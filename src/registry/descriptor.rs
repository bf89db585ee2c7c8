//! Static resource descriptors: per-entity field metadata declared at startup.

use serde::Serialize;

/// Declared type of a persisted field, fixed at descriptor construction.
/// Fields registered without an explicit cast get one inferred from their
/// name (see [`FieldCast::infer`]); everything downstream dispatches on this
/// enum, never on the field name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldCast {
    Text,
    Integer,
    Boolean,
    Decimal,
    Json,
    DateTime,
    Date,
    Email,
    Password,
}

impl FieldCast {
    /// Infer a cast from naming conventions, for fields declared without one.
    pub fn infer(name: &str) -> FieldCast {
        if name.contains("password") {
            return FieldCast::Password;
        }
        if name.contains("email") {
            return FieldCast::Email;
        }
        if name.ends_with("_ids")
            || matches!(
                last_segment(name),
                "categories" | "tags" | "attributes" | "variations" | "images" | "meta_data"
            )
        {
            return FieldCast::Json;
        }
        if name.ends_with("_id") {
            return FieldCast::Integer;
        }
        if contains_word(name, &["quantity", "count", "number", "threshold"]) {
            return FieldCast::Integer;
        }
        if contains_word(
            name,
            &["price", "cost", "amount", "rate", "weight", "length", "width", "height"],
        ) {
            return FieldCast::Decimal;
        }
        if contains_word(
            name,
            &["enabled", "active", "track", "required", "taxable", "inclusive"],
        ) {
            return FieldCast::Boolean;
        }
        FieldCast::Text
    }

    /// Form input kind for the schema payload.
    pub fn input_kind(&self) -> &'static str {
        match self {
            FieldCast::Text => "text",
            FieldCast::Integer | FieldCast::Decimal => "number",
            FieldCast::Boolean => "checkbox",
            FieldCast::Json => "list",
            FieldCast::DateTime => "datetime",
            FieldCast::Date => "date",
            FieldCast::Email => "email",
            FieldCast::Password => "password",
        }
    }

    /// PostgreSQL type for SQL casts when binding string/number values,
    /// None when the natural bind type is already correct.
    pub fn pg_cast(&self) -> Option<&'static str> {
        match self {
            FieldCast::DateTime => Some("timestamptz"),
            FieldCast::Date => Some("date"),
            FieldCast::Decimal => Some("numeric"),
            FieldCast::Json => Some("jsonb"),
            _ => None,
        }
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('_').next().unwrap_or(name)
}

fn contains_word(name: &str, words: &[&str]) -> bool {
    name.split('_').any(|seg| words.contains(&seg))
}

/// Primary key type for parsing path ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkType {
    BigInt,
    Uuid,
    Text,
}

/// Per-field metadata. Derived once at registration; never mutated after.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    pub cast: FieldCast,
    pub nullable: bool,
    pub unique: bool,
    pub fillable: bool,
    pub required: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub searchable: bool,
}

impl FieldDescriptor {
    /// New fillable field with the cast inferred from the name.
    pub fn new(name: &str) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            cast: FieldCast::infer(name),
            nullable: true,
            unique: false,
            fillable: true,
            required: false,
            sortable: false,
            filterable: false,
            searchable: false,
        }
    }

    pub fn cast(mut self, cast: FieldCast) -> Self {
        self.cast = cast;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as server-managed (not settable from client input).
    pub fn readonly(mut self) -> Self {
        self.fillable = false;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }
}

/// One table-column entry for the frontend list view.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    pub sortable: bool,
}

impl ColumnSpec {
    pub fn new(key: &str, label: &str) -> Self {
        ColumnSpec {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Fallback when a resource declares no columns of its own.
    pub fn id_fallback() -> Vec<ColumnSpec> {
        vec![ColumnSpec {
            key: "id".into(),
            label: "ID".into(),
            sortable: true,
        }]
    }
}

/// One schema entry for the frontend form view.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    pub nullable: bool,
}

/// Static metadata for one API-exposed entity. Built once at startup,
/// immutable for the process lifetime.
#[derive(Clone, Debug)]
pub struct ResourceDescriptor {
    pub name: String,
    pub table: String,
    /// URI slug; defaults to the pluralized kebab-case of `name`.
    pub slug: String,
    pub pk_column: String,
    pub pk_type: PkType,
    pub fields: Vec<FieldDescriptor>,
    pub columns: Vec<ColumnSpec>,
    pub default_sort: String,
}

impl ResourceDescriptor {
    pub fn new(name: &str, table: &str) -> Self {
        ResourceDescriptor {
            name: name.to_string(),
            table: table.to_string(),
            slug: slugify(name),
            pk_column: "id".into(),
            pk_type: PkType::BigInt,
            fields: Vec::new(),
            columns: Vec::new(),
            default_sort: "id".into(),
        }
    }

    /// Override the derived URI slug.
    pub fn uri(mut self, slug: &str) -> Self {
        self.slug = slug.to_string();
        self
    }

    pub fn pk(mut self, column: &str, pk_type: PkType) -> Self {
        self.pk_column = column.to_string();
        self.pk_type = pk_type;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn default_sort(mut self, column: &str) -> Self {
        self.default_sort = column.to_string();
        self
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fillable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.fillable)
    }

    /// Names accepted by `?sort=`. The pk is always sortable.
    pub fn sortable_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.pk_column.as_str()];
        cols.extend(self.fields.iter().filter(|f| f.sortable).map(|f| f.name.as_str()));
        cols
    }

    pub fn filterable_columns(&self) -> Vec<&str> {
        self.fields.iter().filter(|f| f.filterable).map(|f| f.name.as_str()).collect()
    }

    pub fn searchable_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.searchable && matches!(f.cast, FieldCast::Text | FieldCast::Email))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Schema payload for dynamic form rendering. Password hashes are write-only,
    /// but the field still appears so forms can collect it.
    pub fn schema_fields(&self) -> Vec<SchemaField> {
        self.fillable_fields()
            .map(|f| SchemaField {
                name: f.name.clone(),
                label: humanize(&f.name),
                kind: f.cast.input_kind(),
                required: f.required,
                nullable: f.nullable,
            })
            .collect()
    }

    /// Configured columns, or the ID-only fallback.
    pub fn columns_or_default(&self) -> Vec<ColumnSpec> {
        if self.columns.is_empty() {
            ColumnSpec::id_fallback()
        } else {
            self.columns.clone()
        }
    }
}

/// Pluralized kebab-case slug from an entity name.
/// e.g. "Product" -> "products", "PriceCategory" -> "price-categories"
pub fn slugify(name: &str) -> String {
    let mut kebab = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                kebab.push('-');
            }
            kebab.extend(c.to_lowercase());
        } else if c == '_' || c == ' ' {
            kebab.push('-');
        } else {
            kebab.push(c);
        }
    }
    pluralize(&kebab)
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.map(|c| !"aeiou".contains(c)).unwrap_or(false) {
            return format!("{}ies", stem);
        }
    }
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// "unit_price" -> "Unit Price"
pub fn humanize(name: &str) -> String {
    name.split('_')
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_pluralized_kebab_case() {
        assert_eq!(slugify("Product"), "products");
        assert_eq!(slugify("PriceCategory"), "price-categories");
        assert_eq!(slugify("TaxClass"), "tax-classes");
        assert_eq!(slugify("Day"), "days");
    }

    #[test]
    fn cast_inference_follows_naming_conventions() {
        assert_eq!(FieldCast::infer("password"), FieldCast::Password);
        assert_eq!(FieldCast::infer("billing_email"), FieldCast::Email);
        assert_eq!(FieldCast::infer("stock_quantity"), FieldCast::Integer);
        assert_eq!(FieldCast::infer("category_id"), FieldCast::Integer);
        assert_eq!(FieldCast::infer("unit_price"), FieldCast::Decimal);
        assert_eq!(FieldCast::infer("is_active"), FieldCast::Boolean);
        assert_eq!(FieldCast::infer("track_stock"), FieldCast::Boolean);
        assert_eq!(FieldCast::infer("category_ids"), FieldCast::Json);
        assert_eq!(FieldCast::infer("tags"), FieldCast::Json);
        assert_eq!(FieldCast::infer("description"), FieldCast::Text);
    }

    #[test]
    fn ids_suffix_wins_over_id_suffix() {
        // "_ids" must map to an array, not an integer FK.
        assert_eq!(FieldCast::infer("warehouse_ids"), FieldCast::Json);
        assert_eq!(FieldCast::infer("warehouse_id"), FieldCast::Integer);
    }

    #[test]
    fn columns_fall_back_to_id_only() {
        let desc = ResourceDescriptor::new("Product", "products");
        assert_eq!(desc.columns_or_default(), ColumnSpec::id_fallback());

        let desc = desc.column(ColumnSpec::new("name", "Name").sortable());
        assert_eq!(desc.columns_or_default().len(), 1);
        assert_eq!(desc.columns_or_default()[0].key, "name");
    }

    #[test]
    fn schema_fields_only_cover_fillable() {
        let desc = ResourceDescriptor::new("Product", "products")
            .field(FieldDescriptor::new("name").required())
            .field(FieldDescriptor::new("created_at").cast(FieldCast::DateTime).readonly());
        let schema = desc.schema_fields();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].name, "name");
        assert_eq!(schema[0].label, "Name");
        assert!(schema[0].required);
    }

    #[test]
    fn pk_is_always_sortable() {
        let desc = ResourceDescriptor::new("Product", "products")
            .field(FieldDescriptor::new("name").sortable());
        assert_eq!(desc.sortable_columns(), vec!["id", "name"]);
    }
}
