use super::{
    enums::{BookStatus, Category, MemberStatus},
    record::{EntityKind, FieldKind, FieldSpec, Presence, RawRecord},
};

/// Verdict for one record. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check `record` against the field table of `kind`.
///
/// Every rule runs, so a record missing two fields with a bad category gets
/// three reasons. Absent optional fields are fine; defaults are applied by the
/// transformer.
pub fn validate(record: &RawRecord, kind: EntityKind) -> ValidationResult {
    let errors = kind
        .fields()
        .iter()
        .filter_map(|field| check_field(record, field))
        .collect();

    ValidationResult::from_errors(errors)
}

fn check_field(record: &RawRecord, field: &FieldSpec) -> Option<String> {
    let Some(value) = record.value(field.name) else {
        return match field.presence {
            Presence::Required => Some(format!("Missing required field: {}", field.name)),
            Presence::Optional => None,
        };
    };

    match field.kind {
        FieldKind::Text | FieldKind::Tags => None,
        FieldKind::Integer | FieldKind::Decimal => (!is_number(value))
            .then(|| format!("Invalid number for {}: '{}'", field.name, value)),
        FieldKind::Category => value
            .parse::<Category>()
            .err()
            .map(|_| not_in_set("category", value, &Category::LABELS)),
        FieldKind::BookStatus => value
            .parse::<BookStatus>()
            .err()
            .map(|_| not_in_set("status", value, &BookStatus::LABELS)),
        FieldKind::MemberStatus => value
            .parse::<MemberStatus>()
            .err()
            .map(|_| not_in_set("status", value, &MemberStatus::LABELS)),
    }
}

/// `inf` and `NaN` parse as `f64` but are not numbers a catalog can store.
fn is_number(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

fn not_in_set(field: &str, value: &str, allowed: &[&str]) -> String {
    format!(
        "Invalid {field} '{value}'. Allowed: {}",
        allowed.join(", ")
    )
}
