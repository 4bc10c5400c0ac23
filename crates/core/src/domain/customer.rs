use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::estimate::CustomerSection;
use crate::schema::codes::CustomerType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity fields written ahead of the estimate that references them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub customer_type: CustomerType,
    pub customer_type_other: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl From<&CustomerSection> for NewCustomer {
    fn from(section: &CustomerSection) -> Self {
        Self {
            customer_type: section.customer_type,
            customer_type_other: section
                .customer_type_other
                .clone()
                .filter(|other| !other.is_empty()),
            name: section.name.clone(),
            phone: section.phone.clone(),
            email: section.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub customer_type: CustomerType,
    pub customer_type_other: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn from_new(id: CustomerId, new: NewCustomer, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_type: new.customer_type,
            customer_type_other: new.customer_type_other,
            name: new.name,
            phone: new.phone,
            email: new.email,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomerId, NewCustomer};
    use crate::domain::estimate::CustomerSection;
    use crate::schema::codes::CustomerType;

    #[test]
    fn empty_other_text_is_not_carried_into_the_identity_write() {
        let section = CustomerSection {
            customer_type: CustomerType::Startup,
            customer_type_other: Some(String::new()),
            name: "Kim".to_owned(),
            phone: "010-1234-5678".to_owned(),
            email: "a@b.com".to_owned(),
        };

        let customer = NewCustomer::from(&section);
        assert_eq!(customer.customer_type_other, None);
        assert_eq!(customer.name, "Kim");
    }

    #[test]
    fn customer_ids_serialize_as_bare_uuids() {
        let id = CustomerId::generate();
        let encoded = serde_json::to_value(id).expect("encode id");
        assert_eq!(encoded, serde_json::json!(id.0.to_string()));
    }
}
