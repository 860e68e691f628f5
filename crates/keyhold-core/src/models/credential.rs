//! Credential model.
//!
//! A credential's `type` on the wire fully determines the shape of its
//! `value`, so the two are folded into a single [`CredentialValue`] enum.
//! `Credential` is (de)serialized through an internal wire struct that keeps
//! the raw `type` tag and untyped `value` side by side.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Width of the label column in terminal output, colon included.
const LABEL_WIDTH: usize = 15;

/// Public/private key pair held by `ssh` and `rsa` credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Certificate material. Each part is optional; an empty string means the
/// server did not send it and it is left out of JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub ca: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub certificate: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "String::is_empty")]
    pub private_key: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialValue {
    Value(String),
    Password(String),
    Ssh(KeyPair),
    Rsa(KeyPair),
    Certificate(Certificate),
    /// Any type this client has no dedicated shape for (`json`, `user`, ...).
    Other { credential_type: String, value: Value },
}

impl CredentialValue {
    /// The wire `type` tag for this value.
    pub fn credential_type(&self) -> &str {
        match self {
            CredentialValue::Value(_) => "value",
            CredentialValue::Password(_) => "password",
            CredentialValue::Ssh(_) => "ssh",
            CredentialValue::Rsa(_) => "rsa",
            CredentialValue::Certificate(_) => "certificate",
            CredentialValue::Other { credential_type, .. } => credential_type,
        }
    }

    fn from_wire(credential_type: &str, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match credential_type {
            "value" => CredentialValue::Value(serde_json::from_value(value)?),
            "password" => CredentialValue::Password(serde_json::from_value(value)?),
            "ssh" => CredentialValue::Ssh(serde_json::from_value(value)?),
            "rsa" => CredentialValue::Rsa(serde_json::from_value(value)?),
            "certificate" => CredentialValue::Certificate(serde_json::from_value(value)?),
            other => CredentialValue::Other {
                credential_type: other.to_string(),
                value,
            },
        })
    }

    fn to_wire(&self) -> Value {
        match self {
            CredentialValue::Value(s) | CredentialValue::Password(s) => Value::String(s.clone()),
            CredentialValue::Ssh(pair) | CredentialValue::Rsa(pair) => serde_json::json!({
                "public_key": pair.public_key,
                "private_key": pair.private_key,
            }),
            CredentialValue::Certificate(cert) => {
                let mut map = serde_json::Map::new();
                for (key, field) in [
                    ("ca", &cert.ca),
                    ("certificate", &cert.certificate),
                    ("private_key", &cert.private_key),
                ] {
                    if !field.is_empty() {
                        map.insert(key.to_string(), Value::String(field.clone()));
                    }
                }
                Value::Object(map)
            }
            CredentialValue::Other { value, .. } => value.clone(),
        }
    }

    /// Type-specific `(label, value)` lines for terminal output.
    fn terminal_lines(&self) -> Vec<(&'static str, String)> {
        match self {
            CredentialValue::Value(s) | CredentialValue::Password(s) => vec![("Value", s.clone())],
            CredentialValue::Ssh(pair) | CredentialValue::Rsa(pair) => vec![
                ("Public Key", pair.public_key.clone()),
                ("Private Key", pair.private_key.clone()),
            ],
            CredentialValue::Certificate(cert) => [
                ("Ca", &cert.ca),
                ("Certificate", &cert.certificate),
                ("Private Key", &cert.private_key),
            ]
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(label, v)| (label, v.clone()))
            .collect(),
            CredentialValue::Other { value, .. } => vec![("Value", value.to_string())],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CredentialWire", into = "CredentialWire")]
pub struct Credential {
    pub id: String,
    pub name: String,
    pub version_created_at: String,
    pub value: CredentialValue,
}

#[derive(Serialize, Deserialize)]
struct CredentialWire {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    name: String,
    #[serde(rename = "type")]
    credential_type: String,
    value: Value,
    #[serde(default)]
    version_created_at: String,
}

impl TryFrom<CredentialWire> for Credential {
    type Error = serde_json::Error;

    fn try_from(wire: CredentialWire) -> Result<Self, Self::Error> {
        Ok(Credential {
            value: CredentialValue::from_wire(&wire.credential_type, wire.value)?,
            id: wire.id,
            name: wire.name,
            version_created_at: wire.version_created_at,
        })
    }
}

impl From<Credential> for CredentialWire {
    fn from(credential: Credential) -> Self {
        CredentialWire {
            credential_type: credential.value.credential_type().to_string(),
            value: credential.value.to_wire(),
            id: credential.id,
            name: credential.name,
            version_created_at: credential.version_created_at,
        }
    }
}

impl Credential {
    pub fn credential_type(&self) -> &str {
        self.value.credential_type()
    }

    /// Human-readable rendering, one `Label:` line per field, no trailing
    /// newline.
    pub fn terminal(&self) -> String {
        let mut lines = vec![
            label_line("Type", self.credential_type()),
            label_line("Name", &self.name),
        ];
        lines.extend(
            self.value
                .terminal_lines()
                .iter()
                .map(|(label, value)| label_line(label, value)),
        );
        lines.push(label_line("Updated", &self.version_created_at));
        lines.join("\n")
    }

    /// Pretty-printed JSON in the server's wire shape.
    pub fn json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn label_line(label: &str, value: &str) -> String {
    format!("{:<width$}{}", format!("{}:", label), value, width = LABEL_WIDTH)
}

/// A credential whose value has already been narrowed to one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedCredential<V> {
    pub id: String,
    pub name: String,
    pub version_created_at: String,
    pub value: V,
}

impl Credential {
    /// Narrow to a typed credential if `extract` accepts the value, otherwise
    /// hand the credential back unchanged.
    pub fn narrow<V>(
        self,
        extract: impl FnOnce(CredentialValue) -> Result<V, CredentialValue>,
    ) -> Result<TypedCredential<V>, Credential> {
        let Credential {
            id,
            name,
            version_created_at,
            value,
        } = self;
        match extract(value) {
            Ok(value) => Ok(TypedCredential {
                id,
                name,
                version_created_at,
                value,
            }),
            Err(value) => Err(Credential {
                id,
                name,
                version_created_at,
                value,
            }),
        }
    }
}
