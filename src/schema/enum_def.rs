use diesel_derive_enum::DbEnum;
use serde::{Serialize, Deserialize};
use strum_macros::Display;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, DbEnum, Default, Display)]
#[db_enum(pg_type = "provider_kind_enum")]
#[db_enum(value_style = "snake_case")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Openai,
    Deepseek,
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, DbEnum, Default, Display)]
#[db_enum(pg_type = "message_role_enum")]
#[db_enum(value_style = "snake_case")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
    System,
}
