use serde::Serialize;

use crate::{Client, ClientDraft, Receivable, ResultEngine, Sale, search::search};

use super::Engine;

/// Sales and receivables referencing one client.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientHistory {
    pub sales: Vec<Sale>,
    pub receivables: Vec<Receivable>,
}

impl ClientHistory {
    /// `true` when deleting the client would orphan records.
    #[must_use]
    pub fn has_records(&self) -> bool {
        !self.sales.is_empty() || !self.receivables.is_empty()
    }
}

impl Engine {
    pub async fn clients(&self) -> Vec<Client> {
        self.all_records().await
    }

    pub async fn client(&self, client_id: &str) -> Option<Client> {
        self.find_record(client_id).await
    }

    /// Creates a client (draft without id) or merge-patches an existing one.
    ///
    /// Updating an unknown id fails with `KeyNotFound`.
    pub async fn save_client(&self, draft: ClientDraft) -> ResultEngine<Client> {
        self.save_record("save_client", draft).await
    }

    /// Deletes a client. Sales and receivables keep their `clientId`.
    pub async fn delete_client(&self, client_id: &str) -> ResultEngine<()> {
        self.delete_record::<Client>("delete_client", client_id).await
    }

    pub async fn client_history(&self, client_id: &str) -> ClientHistory {
        let doc = self.load().await;
        let belongs = |id: &Option<String>| id.as_deref() == Some(client_id);
        ClientHistory {
            sales: doc
                .sales
                .into_iter()
                .filter(|sale| belongs(&sale.client_id))
                .collect(),
            receivables: doc
                .receivables
                .into_iter()
                .filter(|receivable| belongs(&receivable.client_id))
                .collect(),
        }
    }

    pub async fn search_clients(&self, term: &str) -> Vec<Client> {
        let clients = self.clients().await;
        search(&clients, term).into_iter().cloned().collect()
    }
}
