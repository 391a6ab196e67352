use super::*;

#[derive(Clone, Copy)]
struct EmailContext<'a> {
    entity_type: EntityType,
    entity: &'a Value,
    entity_id: Option<EntityId>,
    token: &'a str,
}

impl WorkflowService {
    pub(super) async fn execute_send_email(
        &self,
        entity_type: EntityType,
        entity: &Value,
        metadata: &EventMetadata,
        action: &SendEmailAction,
    ) -> AppResult<()> {
        let token = self.token_provider.bearer_token(metadata).await?;
        let context = EmailContext {
            entity_type,
            entity,
            entity_id: metadata.entity_id(),
            token: &token,
        };
        let mut users = HashMap::new();

        let from = self
            .resolve_participants(std::slice::from_ref(&action.from), context, &mut users)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| execution_error(ExecutionStage::SendEmail, "sender cannot be resolved"))?;
        let to = self
            .resolve_participants(&action.to, context, &mut users)
            .await;
        if to.is_empty() {
            return Err(execution_error(
                ExecutionStage::SendEmail,
                "no recipient could be resolved",
            ));
        }
        let cc = self.resolve_participants(&action.cc, context, &mut users).await;
        let bcc = self
            .resolve_participants(&action.bcc, context, &mut users)
            .await;

        self.publisher
            .publish(OutboundMessage::SendEmail(SendEmailEvent {
                template_id: action.email_template_id,
                from,
                to,
                cc,
                bcc,
                entity_type,
                entity_id: metadata.entity_id(),
                metadata: metadata.clone(),
            }))
            .await
    }

    async fn resolve_participants(
        &self,
        participants: &[EmailParticipant],
        context: EmailContext<'_>,
        users: &mut HashMap<i64, Option<EmailRecipient>>,
    ) -> Vec<EmailRecipient> {
        let mut recipients = Vec::new();
        for participant in participants {
            let role = match participant {
                EmailParticipant::Fixed {
                    entity,
                    id,
                    name,
                    email,
                } => {
                    recipients.push(EmailRecipient {
                        entity: entity.clone(),
                        id: Some(*id),
                        name: name.clone(),
                        email: email.clone(),
                    });
                    continue;
                }
                EmailParticipant::AllAvailableEmails => {
                    recipients.extend(record_emails(context, false));
                    continue;
                }
                EmailParticipant::PrimaryEmail => {
                    recipients.extend(record_emails(context, true));
                    continue;
                }
                EmailParticipant::RecordOwner => "owner",
                EmailParticipant::RecordCreatedBy => "createdBy",
                EmailParticipant::RecordUpdatedBy => "updatedBy",
            };

            let Some(user_id) = self.resolver.id(context.entity_type, context.entity, role) else {
                warn!(role, "email participant has no user on the record, dropped");
                continue;
            };

            if !users.contains_key(&user_id) {
                let resolved = self.lookup_recipient(user_id, context.token).await;
                users.insert(user_id, resolved);
            }

            if let Some(Some(recipient)) = users.get(&user_id) {
                recipients.push(recipient.clone());
            }
        }

        recipients
    }

    async fn lookup_recipient(&self, user_id: i64, token: &str) -> Option<EmailRecipient> {
        match self.directory.user(token, UserId::new(user_id)).await {
            Ok(profile) if !profile.email.trim().is_empty() => Some(EmailRecipient {
                entity: "user".to_owned(),
                id: Some(user_id),
                name: profile.full_name(),
                email: profile.email,
            }),
            Ok(_) => {
                warn!(user_id, "email participant has no email address, dropped");
                None
            }
            Err(error) => {
                warn!(user_id, error = %error, "email participant lookup failed, dropped");
                None
            }
        }
    }
}

fn record_emails(context: EmailContext<'_>, primary_only: bool) -> Vec<EmailRecipient> {
    let Some(Value::Array(emails)) = context.entity.get("emails") else {
        return Vec::new();
    };
    let name = record_display_name(context.entity);

    emails
        .iter()
        .filter(|email| !primary_only || email.get("primary").and_then(Value::as_bool) == Some(true))
        .filter_map(|email| match email {
            Value::Object(map) => map.get("value").and_then(Value::as_str),
            Value::String(address) => Some(address.as_str()),
            _ => None,
        })
        .filter(|address| !address.trim().is_empty())
        .map(|address| EmailRecipient {
            entity: context.entity_type.as_str().to_lowercase(),
            id: context.entity_id.map(|entity_id| entity_id.as_i64()),
            name: name.clone(),
            email: address.to_owned(),
        })
        .collect()
}

fn record_display_name(entity: &Value) -> String {
    if let Some(name) = entity.get("name").and_then(Value::as_str) {
        return name.to_owned();
    }

    let part = |field: &str| entity.get(field).and_then(Value::as_str).unwrap_or_default();
    format!("{} {}", part("firstName"), part("lastName"))
        .trim()
        .to_owned()
}
