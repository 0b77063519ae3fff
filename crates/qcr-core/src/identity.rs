use serde::{Deserialize, Serialize};

/// A worker on the roster. The display name is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
  pub name:                  String,
  pub role:                  Option<String>,
  pub primary_department:    Option<String>,
  pub certified_departments: Vec<String>,
}

impl CanonicalIdentity {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:                  name.into(),
      role:                  None,
      primary_department:    None,
      certified_departments: Vec::new(),
    }
  }
}
