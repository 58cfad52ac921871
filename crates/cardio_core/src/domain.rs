//! crates/cardio_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Records are documents: the fixed cardio fields plus any extra attributes
//! already present in the store are kept as a JSON object.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::ports::{PortError, PortResult};

/// A JSON object as held by the document store.
pub type Document = Map<String, Value>;

/// Name under which the store-generated identifier is exposed.
pub const OBJECT_ID_FIELD: &str = "_id";

/// Fields a new cardio record must carry, in the order they are checked.
pub const REQUIRED_RECORD_FIELDS: [&str; 15] = [
    "id",
    "age",
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "cardio",
    "url",
    "qrcode_filename",
];

/// Optional attribute holding the asset-host path of the record's image.
pub const IMAGE_PATH_FIELD: &str = "path";

//=========================================================================================
// Cardio Records
//=========================================================================================

/// A stored cardio record.
#[derive(Debug, Clone, PartialEq)]
pub struct CardioRecord {
    /// Store-generated identifier, distinct from the caller-supplied `id`.
    pub object_id: String,
    pub id: i64,
    pub document: Document,
}

impl CardioRecord {
    /// The image path attribute, if the record has a string one.
    pub fn image_path(&self) -> Option<&str> {
        self.document.get(IMAGE_PATH_FIELD).and_then(Value::as_str)
    }

    /// The full record as returned to clients, including `_id`.
    pub fn to_json(&self) -> Value {
        let mut document = self.document.clone();
        document.insert(
            OBJECT_ID_FIELD.to_string(),
            Value::String(self.object_id.clone()),
        );
        Value::Object(document)
    }
}

/// A caller-constructed record that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCardioRecord {
    pub id: i64,
    pub document: Document,
}

impl NewCardioRecord {
    /// Builds a record from a request body.
    ///
    /// Every field in [`REQUIRED_RECORD_FIELDS`] must be present; `path` is kept
    /// when supplied as a string. Anything else in the body is dropped.
    pub fn from_json(body: &Value) -> PortResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| PortError::InvalidFormat("request body must be a JSON object".into()))?;

        let mut document = Document::new();
        for field in REQUIRED_RECORD_FIELDS {
            let value = object
                .get(field)
                .ok_or_else(|| PortError::MissingField(field.to_string()))?;
            document.insert(field.to_string(), value.clone());
        }

        let id = object
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| PortError::InvalidFormat("id must be an integer".into()))?;

        if let Some(path) = object.get(IMAGE_PATH_FIELD) {
            if !path.is_string() {
                return Err(PortError::InvalidFormat("path must be a string".into()));
            }
            document.insert(IMAGE_PATH_FIELD.to_string(), path.clone());
        }

        Ok(Self { id, document })
    }
}

/// New body measurements to merge into an existing record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementUpdate {
    pub height: i64,
    pub weight: f64,
}

impl MeasurementUpdate {
    /// Reads `height` and `weight` from an update body.
    ///
    /// The flat form `{"height": .., "weight": ..}` is preferred. Older clients
    /// nest the values as `{"sessionsByUser": {"<id>": {..}}}`, which is used
    /// when neither flat field is present.
    pub fn from_json(record_id: i64, body: &Value) -> PortResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| PortError::InvalidFormat("request body must be a JSON object".into()))?;

        let source = if object.contains_key("height") || object.contains_key("weight") {
            object
        } else {
            object
                .get("sessionsByUser")
                .and_then(|sessions| sessions.get(record_id.to_string()))
                .and_then(Value::as_object)
                .unwrap_or(object)
        };

        let height = source
            .get("height")
            .ok_or_else(|| PortError::MissingField("height".into()))?;
        let weight = source
            .get("weight")
            .ok_or_else(|| PortError::MissingField("weight".into()))?;

        Ok(Self {
            height: coerce_integer("height", height)?,
            weight: coerce_float("weight", weight)?,
        })
    }
}

/// Integer coercion: integers pass, floats truncate toward zero, strings must
/// spell an integer.
fn coerce_integer(field: &str, value: &Value) -> PortResult<i64> {
    let invalid = || PortError::InvalidFormat(format!("{field} must be an integer"));
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                let f = n.as_f64().filter(|f| f.is_finite()).ok_or_else(invalid)?;
                if f < i64::MIN as f64 || f > i64::MAX as f64 {
                    return Err(invalid());
                }
                Ok(f.trunc() as i64)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn coerce_float(field: &str, value: &Value) -> PortResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| PortError::InvalidFormat(format!("{field} must be a number")))
}

//=========================================================================================
// Accounts and Sessions
//=========================================================================================

/// Account data to persist at registration. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: String,
    pub hashed_password: String,
}

// Represents a logged-in client; the session store keys it by token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
