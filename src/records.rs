use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One roster entry. Field names on the wire match the browser-era slot
/// payload so existing dumps load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll: String,
    pub name: String,
    pub semester: String,
    pub phone: String,
    pub parent_phone: String,
    pub email: String,
    #[serde(serialize_with = "fee_to_json", deserialize_with = "fee_from_json")]
    pub total_fees: f64,
    #[serde(serialize_with = "fee_to_json", deserialize_with = "fee_from_json")]
    pub paid_fees: f64,
}

impl StudentRecord {
    pub fn remaining_fees(&self) -> f64 {
        self.total_fees - self.paid_fees
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("roll", &self.roll),
            ("name", &self.name),
            ("semester", &self.semester),
            ("phone", &self.phone),
            ("parentPhone", &self.parent_phone),
            ("email", &self.email),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        for (field, value) in [("totalFees", self.total_fees), ("paidFees", self.paid_fees)] {
            if !value.is_finite() {
                return Err(ValidationError::NotANumber(field));
            }
            if value < 0.0 {
                return Err(ValidationError::NegativeFee(field));
            }
        }
        if self.paid_fees > self.total_fees {
            return Err(ValidationError::PaidExceedsTotal {
                paid: self.paid_fees,
                total: self.total_fees,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("{0} must be a number")]
    NotANumber(&'static str),
    #[error("{0} must not be negative")]
    NegativeFee(&'static str),
    #[error("paid fees ({paid}) cannot be greater than total fees ({total})")]
    PaidExceedsTotal { paid: f64, total: f64 },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(f)
            | ValidationError::NotANumber(f)
            | ValidationError::NegativeFee(f) => *f,
            ValidationError::PaidExceedsTotal { .. } => "paidFees",
        }
    }
}

/// Form input as typed by the user. Fees stay textual until coerced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentDraft {
    pub roll: String,
    pub name: String,
    pub semester: String,
    pub phone: String,
    pub parent_phone: String,
    pub email: String,
    #[serde(deserialize_with = "fee_text_from_json")]
    pub total_fees: String,
    #[serde(deserialize_with = "fee_text_from_json")]
    pub paid_fees: String,
}

impl StudentDraft {
    /// Add path: every text field is trimmed before it is checked.
    pub fn to_record_trimmed(&self) -> StudentRecord {
        StudentRecord {
            roll: self.roll.trim().to_string(),
            name: self.name.trim().to_string(),
            semester: self.semester.trim().to_string(),
            phone: self.phone.trim().to_string(),
            parent_phone: self.parent_phone.trim().to_string(),
            email: self.email.trim().to_string(),
            total_fees: parse_number(&self.total_fees),
            paid_fees: parse_number(&self.paid_fees),
        }
    }

    /// Update path: text fields are stored exactly as typed.
    pub fn to_record_raw(&self) -> StudentRecord {
        StudentRecord {
            roll: self.roll.clone(),
            name: self.name.clone(),
            semester: self.semester.clone(),
            phone: self.phone.clone(),
            parent_phone: self.parent_phone.clone(),
            email: self.email.clone(),
            total_fees: parse_number(&self.total_fees),
            paid_fees: parse_number(&self.paid_fees),
        }
    }
}

const RADIX_PREFIXES: [(&str, u32); 6] = [
    ("0x", 16),
    ("0X", 16),
    ("0o", 8),
    ("0O", 8),
    ("0b", 2),
    ("0B", 2),
];

/// Numeric coercion with form-input semantics: blank is zero, junk is NaN.
/// Unsigned `0x`/`0o`/`0b` literals are accepted. Anything that is not a
/// finite number (`inf`, `1e999`) is NaN.
pub fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in RADIX_PREFIXES {
        if let Some(digits) = t.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}

/// `50000.0` prints as `50000`, `2.5` as `2.5`, NaN as `NaN`.
pub fn format_fee(value: f64) -> String {
    value.to_string()
}

fn fee_to_json<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        s.serialize_f64(*value)
    } else {
        s.serialize_none()
    }
}

fn fee_from_json<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Option::<f64>::deserialize(d)?;
    Ok(v.unwrap_or(f64::NAN))
}

fn fee_text_from_json<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}
