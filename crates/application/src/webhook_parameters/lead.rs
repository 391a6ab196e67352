use super::{RecordAttribute, RecordCatalog};

/// Webhook-visible attributes of a lead.
pub(crate) struct LeadCatalog;

impl RecordCatalog for LeadCatalog {
    fn declared(&self, name: &str) -> Option<RecordAttribute> {
        let path = match name {
            "emails" => return Some(RecordAttribute::Emails("emails")),
            "phoneNumbers" => return Some(RecordAttribute::Phones("phoneNumbers")),
            "companyPhones" => return Some(RecordAttribute::Phones("companyPhones")),
            "products" => return Some(RecordAttribute::Names("products")),
            "pipeline" => "pipeline.name",
            "pipelineStage" => "pipelineStage.name",
            "source" => "source.name",
            "campaign" => "campaign.name",
            "id" | "salutation" | "firstName" | "lastName" | "address" | "city" | "state"
            | "zipcode" | "country" | "timezone" | "designation" | "department"
            | "companyName" | "companyWebsite" | "companyIndustry" | "companyEmployees"
            | "companyAnnualRevenue" | "requirementName" | "requirementBudget"
            | "requirementCurrency" | "createdAt" | "updatedAt" => name,
            _ => return None,
        };

        Some(RecordAttribute::Text(path.to_owned()))
    }
}
