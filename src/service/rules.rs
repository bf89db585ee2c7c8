//! Validation rule synthesis from field descriptors. No per-resource rule
//! classes: rules are derived by exhaustive dispatch over [`FieldCast`].

use crate::error::ValidationErrors;
use crate::registry::{FieldCast, ResourceDescriptor};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn date_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleMode {
    Create,
    Update,
}

/// One synthesized check applied to a supplied, non-null value.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Text,
    Integer,
    Numeric,
    Boolean,
    Array,
    DateTime,
    /// Strict YYYY-MM-DD.
    Date,
    Email,
    MinLength(usize),
}

/// Rules for one field. All rules are present-if-supplied; `required` is
/// enforced only on create, and never for update payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRules {
    pub required: bool,
    pub rules: Vec<Rule>,
}

/// Field name -> rule set for every fillable field of the resource.
pub fn synthesize(desc: &ResourceDescriptor, mode: RuleMode) -> BTreeMap<String, FieldRules> {
    let mut out = BTreeMap::new();
    for field in desc.fillable_fields() {
        let rules = match field.cast {
            FieldCast::Text => vec![Rule::Text],
            FieldCast::Integer => vec![Rule::Integer],
            FieldCast::Decimal => vec![Rule::Numeric],
            FieldCast::Boolean => vec![Rule::Boolean],
            FieldCast::Json => vec![Rule::Array],
            FieldCast::DateTime => vec![Rule::DateTime],
            FieldCast::Date => vec![Rule::Date],
            FieldCast::Email => vec![Rule::Text, Rule::Email],
            // Optional even when marked required on update; empty values are
            // dropped from the payload before validation (see CrudService).
            FieldCast::Password => vec![Rule::Text, Rule::MinLength(PASSWORD_MIN_LEN)],
        };
        let required = mode == RuleMode::Create && field.required;
        out.insert(field.name.clone(), FieldRules { required, rules });
    }
    out
}

/// Validate a body against synthesized rules. Unknown keys are ignored (only
/// fillable fields are ever persisted); all failures are collected per field.
pub fn validate_body(
    body: &Map<String, Value>,
    rules: &BTreeMap<String, FieldRules>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for (field, field_rules) in rules {
        let value = body.get(field);
        match value {
            None => {
                if field_rules.required {
                    errors
                        .entry(field.clone())
                        .or_default()
                        .push(format!("{} is required", field));
                }
            }
            Some(Value::Null) => {
                if field_rules.required {
                    errors
                        .entry(field.clone())
                        .or_default()
                        .push(format!("{} is required", field));
                }
            }
            Some(v) => {
                for rule in &field_rules.rules {
                    if let Some(msg) = check(field, v, rule) {
                        errors.entry(field.clone()).or_default().push(msg);
                    }
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check(field: &str, v: &Value, rule: &Rule) -> Option<String> {
    match rule {
        Rule::Text => (!v.is_string()).then(|| format!("{} must be a string", field)),
        Rule::Integer => {
            let ok = v.as_i64().is_some() || v.as_u64().is_some();
            (!ok).then(|| format!("{} must be an integer", field))
        }
        Rule::Numeric => (!v.is_number()).then(|| format!("{} must be numeric", field)),
        Rule::Boolean => (!v.is_boolean()).then(|| format!("{} must be a boolean", field)),
        Rule::Array => (!v.is_array()).then(|| format!("{} must be an array", field)),
        Rule::DateTime => {
            let ok = v
                .as_str()
                .map(|s| {
                    chrono::DateTime::parse_from_rfc3339(s).is_ok()
                        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
                })
                .unwrap_or(false);
            (!ok).then(|| format!("{} must be a valid datetime", field))
        }
        Rule::Date => {
            let ok = v
                .as_str()
                .map(|s| {
                    date_shape().is_match(s)
                        && chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                })
                .unwrap_or(false);
            (!ok).then(|| format!("{} must be a date in YYYY-MM-DD format", field))
        }
        Rule::Email => {
            let ok = v
                .as_str()
                .map(|s| s.len() >= 3 && s.contains('@') && !s.starts_with('@') && !s.ends_with('@'))
                .unwrap_or(false);
            (!ok).then(|| format!("{} must be a valid email address", field))
        }
        Rule::MinLength(min) => {
            let too_short = v.as_str().map(|s| s.chars().count() < *min).unwrap_or(false);
            too_short.then(|| format!("{} must be at least {} characters", field, min))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldDescriptor;
    use serde_json::json;

    fn desc() -> ResourceDescriptor {
        ResourceDescriptor::new("Product", "products")
            .field(FieldDescriptor::new("name").required())
            .field(FieldDescriptor::new("unit_price"))
            .field(FieldDescriptor::new("stock_quantity"))
            .field(FieldDescriptor::new("is_active"))
            .field(FieldDescriptor::new("tags"))
            .field(FieldDescriptor::new("released_on").cast(FieldCast::Date))
            .field(FieldDescriptor::new("restocked_at").cast(FieldCast::DateTime))
            .field(FieldDescriptor::new("contact_email").unique())
            .field(FieldDescriptor::new("password"))
            .field(FieldDescriptor::new("created_at").cast(FieldCast::DateTime).readonly())
    }

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn rules_follow_casts_exhaustively() {
        let rules = synthesize(&desc(), RuleMode::Create);
        assert_eq!(rules["name"].rules, vec![Rule::Text]);
        assert_eq!(rules["unit_price"].rules, vec![Rule::Numeric]);
        assert_eq!(rules["stock_quantity"].rules, vec![Rule::Integer]);
        assert_eq!(rules["is_active"].rules, vec![Rule::Boolean]);
        assert_eq!(rules["tags"].rules, vec![Rule::Array]);
        assert_eq!(rules["released_on"].rules, vec![Rule::Date]);
        assert_eq!(rules["restocked_at"].rules, vec![Rule::DateTime]);
        assert_eq!(rules["contact_email"].rules, vec![Rule::Text, Rule::Email]);
        assert_eq!(rules["password"].rules, vec![Rule::Text, Rule::MinLength(8)]);
        // readonly fields get no rules at all
        assert!(!rules.contains_key("created_at"));
    }

    #[test]
    fn required_applies_only_on_create() {
        let create = synthesize(&desc(), RuleMode::Create);
        assert!(create["name"].required);
        let update = synthesize(&desc(), RuleMode::Update);
        assert!(!update["name"].required);
    }

    #[test]
    fn missing_required_field_is_reported_per_field() {
        let rules = synthesize(&desc(), RuleMode::Create);
        let err = validate_body(&body(json!({"unit_price": 9.5})), &rules).unwrap_err();
        assert_eq!(err["name"], vec!["name is required".to_string()]);
        assert!(!err.contains_key("unit_price"));
    }

    #[test]
    fn type_mismatches_are_collected_not_short_circuited() {
        let rules = synthesize(&desc(), RuleMode::Update);
        let err = validate_body(
            &body(json!({"unit_price": "cheap", "is_active": "yes", "tags": "red"})),
            &rules,
        )
        .unwrap_err();
        assert_eq!(err.len(), 3);
        assert_eq!(err["unit_price"], vec!["unit_price must be numeric".to_string()]);
        assert_eq!(err["is_active"], vec!["is_active must be a boolean".to_string()]);
        assert_eq!(err["tags"], vec!["tags must be an array".to_string()]);
    }

    #[test]
    fn null_is_accepted_for_optional_fields() {
        let rules = synthesize(&desc(), RuleMode::Update);
        assert!(validate_body(&body(json!({"unit_price": null})), &rules).is_ok());
    }

    #[test]
    fn date_must_be_strict_iso() {
        let rules = synthesize(&desc(), RuleMode::Update);
        assert!(validate_body(&body(json!({"released_on": "2026-02-28"})), &rules).is_ok());
        for bad in ["28-02-2026", "2026-2-28", "2026-02-30", "yesterday"] {
            assert!(
                validate_body(&body(json!({"released_on": bad})), &rules).is_err(),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn datetime_accepts_rfc3339_and_sql_style() {
        let rules = synthesize(&desc(), RuleMode::Update);
        assert!(validate_body(&body(json!({"restocked_at": "2026-02-28T10:00:00Z"})), &rules).is_ok());
        assert!(validate_body(&body(json!({"restocked_at": "2026-02-28 10:00:00"})), &rules).is_ok());
        assert!(validate_body(&body(json!({"restocked_at": "soon"})), &rules).is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        let rules = synthesize(&desc(), RuleMode::Update);
        assert!(validate_body(&body(json!({"contact_email": "a@b.co"})), &rules).is_ok());
        assert!(validate_body(&body(json!({"contact_email": "not-an-email"})), &rules).is_err());
        assert!(validate_body(&body(json!({"contact_email": "@b.co"})), &rules).is_err());
    }

    #[test]
    fn short_password_is_rejected_when_supplied() {
        let rules = synthesize(&desc(), RuleMode::Create);
        let err = validate_body(&body(json!({"name": "x", "password": "short"})), &rules).unwrap_err();
        assert_eq!(err["password"], vec!["password must be at least 8 characters".to_string()]);
        assert!(validate_body(&body(json!({"name": "x", "password": "longenough"})), &rules).is_ok());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let rules = synthesize(&desc(), RuleMode::Update);
        assert!(validate_body(&body(json!({"no_such_field": 1})), &rules).is_ok());
    }
}
