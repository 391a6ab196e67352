use super::{RecordAttribute, RecordCatalog};

/// Webhook-visible attributes of a deal.
pub(crate) struct DealCatalog;

impl RecordCatalog for DealCatalog {
    fn declared(&self, name: &str) -> Option<RecordAttribute> {
        let path = match name {
            "estimatedValue" => return Some(RecordAttribute::Money("estimatedValue")),
            "actualValue" => return Some(RecordAttribute::Money("actualValue")),
            "products" => return Some(RecordAttribute::Names("products")),
            "associatedContacts" => return Some(RecordAttribute::Names("associatedContacts")),
            "company" => "company.name",
            "pipeline" => "pipeline.name",
            "pipelineStage" => "pipelineStage.name",
            "source" => "source.name",
            "campaign" => "campaign.name",
            "id" | "name" | "estimatedClosureOn" | "actualClosureDate" | "forecastingType"
            | "createdAt" | "updatedAt" => name,
            _ => return None,
        };

        Some(RecordAttribute::Text(path.to_owned()))
    }
}
