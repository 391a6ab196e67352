use super::{RecordAttribute, RecordCatalog};

/// Webhook-visible attributes of a contact.
pub(crate) struct ContactCatalog;

impl RecordCatalog for ContactCatalog {
    fn declared(&self, name: &str) -> Option<RecordAttribute> {
        let path = match name {
            "emails" => return Some(RecordAttribute::Emails("emails")),
            "phoneNumbers" => return Some(RecordAttribute::Phones("phoneNumbers")),
            "company" => "company.name",
            "source" => "source.name",
            "campaign" => "campaign.name",
            "id" | "salutation" | "firstName" | "lastName" | "address" | "city" | "state"
            | "zipcode" | "country" | "timezone" | "designation" | "department"
            | "stakeholder" | "createdAt" | "updatedAt" => name,
            _ => return None,
        };

        Some(RecordAttribute::Text(path.to_owned()))
    }
}
