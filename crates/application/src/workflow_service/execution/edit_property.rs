use super::*;

impl WorkflowService {
    pub(super) fn execute_edit_property(
        &self,
        entity_type: EntityType,
        entity: &mut Value,
        action: &EditPropertyAction,
    ) -> AppResult<PropertyWrite> {
        let field = action.name.trim();
        let value = self.converter.convert_for(entity_type, field, &action.value)?;
        let write = EntityPropertyAccessor::for_entity_type(entity_type).set(entity, field, value)?;

        if write == PropertyWrite::UnknownField {
            warn!(entity_type = %entity_type, field, "unknown field in edit action, skipped");
        }

        Ok(write)
    }
}
