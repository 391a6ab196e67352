use super::*;

impl WorkflowService {
    pub(super) async fn execute_reassign(
        &self,
        entity_type: EntityType,
        metadata: &EventMetadata,
        action: &ReassignAction,
    ) -> AppResult<()> {
        let entity_id = require_entity_id(metadata, ExecutionStage::Reassign)?;

        self.publisher
            .publish(OutboundMessage::Reassign(ReassignCommand {
                entity_type,
                entity_id,
                owner_id: action.owner_id,
                owner_name: action.name.clone(),
                metadata: metadata.clone(),
            }))
            .await
    }
}
