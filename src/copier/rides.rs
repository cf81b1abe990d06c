use serde_json::{Map, Value};

use crate::store::Document;

/// A ride request as read from the source collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RideRequest {
    doc: Document,
}

impl RideRequest {
    pub fn from_document(doc: Document) -> Self {
        Self { doc }
    }

    pub fn created_at(&self, field: &str) -> Option<u64> {
        self.doc.timestamp(field)
    }
}

/// Copy of a ride request kept in the recent collection until `expires_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentRideRequest {
    pub id: String,
    pub fields: Map<String, Value>,
    pub expires_at: u64,
}

impl RecentRideRequest {
    pub fn from_ride(ride: RideRequest, expires_at: u64) -> Self {
        Self {
            id: ride.doc.id,
            fields: ride.doc.fields,
            expires_at,
        }
    }

    /// Body to store: every source field plus the expiry stamp.
    pub fn into_document(self, expires_at_field: &str) -> Document {
        let mut doc = Document::new(self.id, self.fields);
        doc.set_timestamp(expires_at_field, self.expires_at);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn copy_keeps_fields_and_overwrites_stale_expiry() {
        let fields = match json!({"createdAt": 10, "pickup": "Gangnam", "expiresAt": 1}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let ride = RideRequest::from_document(Document::new("ride-1", fields));
        assert_eq!(ride.created_at("createdAt"), Some(10));

        let doc = RecentRideRequest::from_ride(ride, 700).into_document("expiresAt");
        assert_eq!(doc.id, "ride-1");
        assert_eq!(doc.fields["pickup"], json!("Gangnam"));
        assert_eq!(doc.fields["createdAt"], json!(10));
        assert_eq!(doc.timestamp("expiresAt"), Some(700));
    }
}
