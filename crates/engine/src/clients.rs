//! The module contains the `Client` record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ResultEngine, StoreDocument,
    ops::{Collection, Record},
    search::Searchable,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
};

/// A customer of the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Brazilian individual tax id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Insert (no `id`) or merge-patch (with `id`) payload for a client.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl ClientDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl Collection for Client {
    const LABEL: &'static str = "client";

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.clients
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.clients
    }
}

impl Record for Client {
    type Draft = ClientDraft;

    fn draft_id(draft: &ClientDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn create(id: String, draft: ClientDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        let name = normalize_required_text(draft.name.as_deref().unwrap_or_default(), "client name")?;
        Ok(Self {
            id,
            name,
            phone: normalize_optional_text(draft.phone.as_deref()),
            email: normalize_optional_text(draft.email.as_deref()),
            cpf: normalize_optional_text(draft.cpf.as_deref()),
            address: normalize_optional_text(draft.address.as_deref()),
            notes: normalize_optional_text(draft.notes.as_deref()),
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, draft: ClientDraft, now: DateTime<Utc>) -> ResultEngine<()> {
        if let Some(name) = draft.name.as_deref() {
            self.name = normalize_required_text(name, "client name")?;
        }
        self.phone = apply_optional_text_patch(self.phone.take(), draft.phone.as_deref());
        self.email = apply_optional_text_patch(self.email.take(), draft.email.as_deref());
        self.cpf = apply_optional_text_patch(self.cpf.take(), draft.cpf.as_deref());
        self.address = apply_optional_text_patch(self.address.take(), draft.address.as_deref());
        self.notes = apply_optional_text_patch(self.notes.take(), draft.notes.as_deref());
        self.updated_at = now;
        Ok(())
    }
}

impl Searchable for Client {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.name.as_str()),
            self.phone.as_deref(),
            self.email.as_deref(),
            self.cpf.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
