use serde_json::Value;

use super::{ParameterSource, RecordAttribute, ResolvedAliases, TenantAttribute, UserAttribute};
use crate::record_path::{self, text_of};
use crate::workflow_ports::{PhoneNumber, TenantProfile, UserProfile};

pub(super) fn values(
    source: &ParameterSource,
    entity: &Value,
    resolved: &ResolvedAliases,
) -> Vec<String> {
    let values = match source {
        ParameterSource::Record(attribute) => record_values(attribute, entity, resolved),
        ParameterSource::Owner(attribute) => user_values(*attribute, &resolved.owner),
        ParameterSource::CreatedBy(attribute) => user_values(*attribute, &resolved.created_by),
        ParameterSource::UpdatedBy(attribute) => user_values(*attribute, &resolved.updated_by),
        ParameterSource::Tenant(attribute) => tenant_values(*attribute, &resolved.tenant),
    };

    values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect()
}

fn record_values(
    attribute: &RecordAttribute,
    entity: &Value,
    resolved: &ResolvedAliases,
) -> Vec<String> {
    match attribute {
        RecordAttribute::Text(path) => match record_path::present_value_at(entity, path) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(text_of).collect(),
            Some(value) => vec![text_of(value)],
        },
        RecordAttribute::Emails(path) => list_values(entity, path, |item| field_text(item, "value")),
        RecordAttribute::Phones(path) => list_values(entity, path, |item| match item {
            Value::Object(_) => serde_json::from_value::<PhoneNumber>(item.clone())
                .map(|phone| phone.formatted())
                .unwrap_or_default(),
            other => text_of(other),
        }),
        RecordAttribute::Names(path) => list_values(entity, path, |item| field_text(item, "name")),
        RecordAttribute::Money(path) => money_value(entity, path, resolved)
            .into_iter()
            .collect(),
    }
}

fn list_values(entity: &Value, path: &str, render: impl Fn(&Value) -> String) -> Vec<String> {
    match record_path::present_value_at(entity, path) {
        Some(Value::Array(items)) => items.iter().map(render).collect(),
        _ => Vec::new(),
    }
}

fn field_text(item: &Value, field: &str) -> String {
    match item {
        Value::Object(map) => map.get(field).map(text_of).unwrap_or_default(),
        other => text_of(other),
    }
}

fn money_value(entity: &Value, path: &str, resolved: &ResolvedAliases) -> Option<String> {
    let money = record_path::present_value_at(entity, path)?;
    let amount = match record_path::present_value_at(money, "value")? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let code = record_path::id_at(money, "currencyId")
        .and_then(|currency_id| resolved.currencies.get(&currency_id))
        .map(|currency| currency.name.trim())
        .filter(|code| !code.is_empty());

    Some(match code {
        Some(code) => format!("{amount:?} {code}"),
        None => format!("{amount:?}"),
    })
}

fn user_values(attribute: UserAttribute, user: &UserProfile) -> Vec<String> {
    match attribute {
        UserAttribute::Id if user.id > 0 => vec![user.id.to_string()],
        UserAttribute::Id => Vec::new(),
        UserAttribute::FirstName => vec![user.first_name.clone()],
        UserAttribute::LastName => vec![user.last_name.clone()],
        UserAttribute::FullName => vec![user.full_name()],
        UserAttribute::Email => vec![user.email.clone()],
        UserAttribute::PhoneNumbers => user
            .phone_numbers
            .iter()
            .map(PhoneNumber::formatted)
            .collect(),
        UserAttribute::Designation => vec![user.designation.clone()],
        UserAttribute::Department => vec![user.department.clone()],
        UserAttribute::Timezone => vec![user.timezone.clone()],
    }
}

fn tenant_values(attribute: TenantAttribute, tenant: &TenantProfile) -> Vec<String> {
    match attribute {
        TenantAttribute::Id if tenant.id > 0 => vec![tenant.id.to_string()],
        TenantAttribute::Id => Vec::new(),
        TenantAttribute::AccountName => vec![tenant.account_name.clone()],
        TenantAttribute::CompanyName => vec![tenant.company_name.clone()],
        TenantAttribute::Website => vec![tenant.website.clone()],
        TenantAttribute::Industry => vec![tenant.industry.clone()],
        TenantAttribute::Timezone => vec![tenant.timezone.clone()],
    }
}
