//! Applies create/update/delete semantics per document kind.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::{DocKind, EventKind};
use crate::domain::models::{id_string, Member, Organization, TaskDocument, Team};
use crate::domain::store::{DocumentStore, IndexNames, StoreError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("payload has no identifiable document")]
    MissingDocumentId,
    #[error("child payload has no resolvable parent organization")]
    MissingParentOrgId,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Upserted,
    Deleted,
    MergedIntoOrganization,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    pub id: String,
    pub index: String,
}

/// Reconciles classified change-events against the store.
///
/// All writes are idempotent: tasks and organizations replace by
/// identifier, children merge by identifier, deletes are no-ops when the
/// document is already gone. At-least-once delivery is the webhook
/// source's concern.
pub struct DocumentReconciler<S: DocumentStore> {
    store: S,
    indices: IndexNames,
}

impl<S: DocumentStore> DocumentReconciler<S> {
    pub fn new(store: S, indices: IndexNames) -> Self {
        Self { store, indices }
    }

    pub async fn apply(
        &self,
        event: EventKind,
        kind: DocKind,
        payload: &Value,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        match event {
            EventKind::Delete => self.delete(kind, payload).await,
            EventKind::Upsert => match kind {
                DocKind::Task => self.upsert_task(payload).await,
                DocKind::Organization => self.upsert_organization(payload).await,
                DocKind::Team | DocKind::OrgMember => self.merge_into_parent(kind, payload).await,
            },
        }
    }

    /// Every index this kind's documents can live in. Children share
    /// their parent organization's index.
    fn candidate_indices(&self, kind: DocKind) -> Vec<&str> {
        match kind {
            DocKind::Task => vec![self.indices.tasks.as_str()],
            DocKind::Organization | DocKind::Team | DocKind::OrgMember => {
                vec![self.indices.organizations.as_str()]
            }
        }
    }

    async fn delete(
        &self,
        kind: DocKind,
        payload: &Value,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let id = id_string(payload.get("id")).ok_or(ReconcileError::MissingDocumentId)?;
        let candidates = self.candidate_indices(kind);

        // Deleting an absent document is not an error to the caller
        for index in candidates.iter().copied() {
            if let Err(err) = self.store.delete_document(index, &id).await {
                tracing::debug!(index, id = %id, "best-effort delete failed: {err}");
            }
            self.refresh_quietly(index).await;
        }

        Ok(ReconcileOutcome {
            action: ReconcileAction::Deleted,
            id,
            index: candidates[0].to_string(),
        })
    }

    async fn upsert_task(&self, payload: &Value) -> Result<ReconcileOutcome, ReconcileError> {
        let id = id_string(payload.get("id")).ok_or(ReconcileError::MissingDocumentId)?;
        let document = TaskDocument::from_payload(id.clone(), payload);

        self.write(&self.indices.tasks, &id, &document).await?;

        Ok(ReconcileOutcome {
            action: ReconcileAction::Upserted,
            id,
            index: self.indices.tasks.clone(),
        })
    }

    async fn upsert_organization(
        &self,
        payload: &Value,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let id = id_string(payload.get("id")).ok_or(ReconcileError::MissingDocumentId)?;
        let aggregate = Organization::from_payload(id.clone(), payload);

        self.write(&self.indices.organizations, &id, &aggregate)
            .await?;

        Ok(ReconcileOutcome {
            action: ReconcileAction::Upserted,
            id,
            index: self.indices.organizations.clone(),
        })
    }

    /// Merge a team or member into its parent aggregate: fetch, mutate the
    /// matching entry in place, write back. The read-modify-write is not
    /// atomic; see DESIGN.md.
    async fn merge_into_parent(
        &self,
        kind: DocKind,
        payload: &Value,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let parent_id = id_string(payload.get("orgId"))
            .or_else(|| id_string(payload.get("organizationId")))
            .ok_or(ReconcileError::MissingParentOrgId)?;

        let mut aggregate = match self
            .store
            .get_document(&self.indices.organizations, &parent_id)
            .await?
        {
            Some(stored) => Organization::from_payload(parent_id.clone(), &stored),
            None => Organization::shell(parent_id.clone()),
        };

        match kind {
            DocKind::OrgMember => aggregate.upsert_member(Member::from_payload(payload)),
            _ => aggregate.upsert_team(Team::from_payload(payload)),
        }

        self.write(&self.indices.organizations, &parent_id, &aggregate)
            .await?;

        Ok(ReconcileOutcome {
            action: ReconcileAction::MergedIntoOrganization,
            id: parent_id,
            index: self.indices.organizations.clone(),
        })
    }

    async fn write<T: Serialize>(
        &self,
        index: &str,
        id: &str,
        document: &T,
    ) -> Result<(), ReconcileError> {
        let body = serde_json::to_value(document)
            .map_err(|err| StoreError::Response(format!("serialize document: {err}")))?;
        self.store.put_document(index, id, &body).await?;
        self.refresh_quietly(index).await;
        Ok(())
    }

    /// Searches just fall back to the store's own refresh interval when
    /// this fails.
    async fn refresh_quietly(&self, index: &str) {
        if let Err(err) = self.store.refresh(index).await {
            tracing::debug!(index, "refresh after write failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::MockDocumentStore;
    use serde_json::json;

    fn reconciler(store: MockDocumentStore) -> DocumentReconciler<MockDocumentStore> {
        DocumentReconciler::new(store, IndexNames::default())
    }

    fn seeded_org() -> Value {
        json!({
            "id": "o1",
            "name": "Acme",
            "slug": "acme",
            "description": "Widgets",
            "members": [
                {"id": "m1", "name": "Ann", "email": "ann@acme.com"},
                {"id": "m2", "name": "Ben", "email": "ben@acme.com"}
            ],
            "teams": [
                {"id": "team1", "name": "Platform", "members": ["m1", "m2"]}
            ],
            "docType": "organization"
        })
    }

    #[tokio::test]
    async fn task_upsert_is_idempotent() {
        let store = MockDocumentStore::new();
        let r = reconciler(store.clone());
        let payload = json!({"id": "t1", "title": "Design review", "userEmail": "a@x.com"});

        let first = r
            .apply(EventKind::Upsert, DocKind::Task, &payload)
            .await
            .unwrap();
        let after_first = store.document("tasks", "t1").unwrap();

        let second = r
            .apply(EventKind::Upsert, DocKind::Task, &payload)
            .await
            .unwrap();
        let after_second = store.document("tasks", "t1").unwrap();

        assert_eq!(first.action, ReconcileAction::Upserted);
        assert_eq!(second.action, ReconcileAction::Upserted);
        assert_eq!(after_first, after_second);
        assert_eq!(store.len(), 1);
        assert_eq!(after_first["docType"], "task");
    }

    #[tokio::test]
    async fn task_update_replaces_wholesale() {
        let store = MockDocumentStore::new();
        let r = reconciler(store.clone());

        let create = json!({"id": "t1", "title": "Old", "description": "keep me?"});
        r.apply(EventKind::Upsert, DocKind::Task, &create)
            .await
            .unwrap();

        let update = json!({"id": "t1", "title": "New"});
        r.apply(EventKind::Upsert, DocKind::Task, &update)
            .await
            .unwrap();

        let stored = store.document("tasks", "t1").unwrap();
        assert_eq!(stored["title"], "New");
        // No partial-field merge for tasks
        assert!(stored.get("description").is_none());
    }

    #[tokio::test]
    async fn upsert_without_id_is_rejected() {
        let r = reconciler(MockDocumentStore::new());
        let err = r
            .apply(EventKind::Upsert, DocKind::Task, &json!({"title": "No id"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::MissingDocumentId));
    }

    #[tokio::test]
    async fn organization_upsert_defaults_collections() {
        let store = MockDocumentStore::new();
        let r = reconciler(store.clone());

        let outcome = r
            .apply(
                EventKind::Upsert,
                DocKind::Organization,
                &json!({"id": "o1", "name": "Acme", "slug": "acme"}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.action, ReconcileAction::Upserted);
        let stored = store.document("organizations", "o1").unwrap();
        assert_eq!(stored["docType"], "organization");
        assert_eq!(stored["members"], json!([]));
        assert_eq!(stored["teams"], json!([]));
    }

    #[tokio::test]
    async fn member_merge_preserves_siblings() {
        let store =
            MockDocumentStore::new().with_document("organizations", "o1", seeded_org());
        let r = reconciler(store.clone());

        let payload = json!({
            "id": "m3",
            "orgId": "o1",
            "name": "Cas",
            "email": "cas@acme.com",
            "role": "viewer"
        });
        let outcome = r
            .apply(EventKind::Upsert, DocKind::OrgMember, &payload)
            .await
            .unwrap();

        assert_eq!(outcome.action, ReconcileAction::MergedIntoOrganization);
        assert_eq!(outcome.id, "o1");

        let stored = store.document("organizations", "o1").unwrap();
        let members = stored["members"].as_array().unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0]["name"], "Ann");
        assert_eq!(members[1]["name"], "Ben");
        assert_eq!(members[2]["email"], "cas@acme.com");
        // Teams and org-level fields are untouched
        assert_eq!(stored["teams"].as_array().unwrap().len(), 1);
        assert_eq!(stored["name"], "Acme");
        assert_eq!(stored["slug"], "acme");
    }

    #[tokio::test]
    async fn member_merge_updates_in_place_with_shallow_merge() {
        let store =
            MockDocumentStore::new().with_document("organizations", "o1", seeded_org());
        let r = reconciler(store.clone());

        // Partial payload: only the role is new
        let payload = json!({"id": "m2", "orgId": "o1", "role": "admin"});
        r.apply(EventKind::Upsert, DocKind::OrgMember, &payload)
            .await
            .unwrap();

        let stored = store.document("organizations", "o1").unwrap();
        let members = stored["members"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1]["name"], "Ben");
        assert_eq!(members[1]["email"], "ben@acme.com");
        assert_eq!(members[1]["role"], "admin");
    }

    #[tokio::test]
    async fn team_merge_finds_or_appends() {
        let store =
            MockDocumentStore::new().with_document("organizations", "o1", seeded_org());
        let r = reconciler(store.clone());

        let payload = json!({
            "id": "team2",
            "orgId": "o1",
            "name": "Design",
            "members": ["m2"]
        });
        r.apply(EventKind::Upsert, DocKind::Team, &payload)
            .await
            .unwrap();

        let stored = store.document("organizations", "o1").unwrap();
        let teams = stored["teams"].as_array().unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0]["name"], "Platform");
        assert_eq!(teams[1]["name"], "Design");
        assert_eq!(stored["members"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn child_merge_without_parent_reference_is_rejected() {
        let r = reconciler(MockDocumentStore::new());
        let err = r
            .apply(
                EventKind::Upsert,
                DocKind::OrgMember,
                &json!({"id": "m1", "email": "ann@acme.com"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::MissingParentOrgId));
    }

    #[tokio::test]
    async fn child_merge_initializes_missing_aggregate() {
        let store = MockDocumentStore::new();
        let r = reconciler(store.clone());

        let payload = json!({"id": "m1", "organizationId": "o9", "email": "ann@acme.com"});
        let outcome = r
            .apply(EventKind::Upsert, DocKind::OrgMember, &payload)
            .await
            .unwrap();

        assert_eq!(outcome.id, "o9");
        let stored = store.document("organizations", "o9").unwrap();
        assert_eq!(stored["name"], "");
        assert_eq!(stored["docType"], "organization");
        assert_eq!(stored["members"].as_array().unwrap().len(), 1);
        assert_eq!(stored["teams"], json!([]));
    }

    #[tokio::test]
    async fn member_without_id_gets_a_generated_one() {
        let store = MockDocumentStore::new();
        let r = reconciler(store.clone());

        let payload = json!({"orgId": "o1", "email": "ann@acme.com"});
        r.apply(EventKind::Upsert, DocKind::OrgMember, &payload)
            .await
            .unwrap();

        let stored = store.document("organizations", "o1").unwrap();
        let id = stored["members"][0]["id"].as_str().unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let store = MockDocumentStore::new()
            .with_document("tasks", "t1", json!({"title": "Design review"}));
        let r = reconciler(store.clone());

        let outcome = r
            .apply(EventKind::Delete, DocKind::Task, &json!({"id": "t1"}))
            .await
            .unwrap();

        assert_eq!(outcome.action, ReconcileAction::Deleted);
        assert_eq!(outcome.index, "tasks");
        assert!(store.document("tasks", "t1").is_none());
    }

    #[tokio::test]
    async fn delete_of_absent_document_succeeds() {
        let r = reconciler(MockDocumentStore::new());
        let outcome = r
            .apply(EventKind::Delete, DocKind::Task, &json!({"id": "ghost"}))
            .await
            .unwrap();
        assert_eq!(outcome.action, ReconcileAction::Deleted);
    }

    #[tokio::test]
    async fn delete_swallows_store_failures() {
        let store = MockDocumentStore::new().failing_deletes();
        let r = reconciler(store);

        let outcome = r
            .apply(EventKind::Delete, DocKind::Organization, &json!({"id": "o1"}))
            .await
            .unwrap();
        assert_eq!(outcome.action, ReconcileAction::Deleted);
        assert_eq!(outcome.index, "organizations");
    }

    #[tokio::test]
    async fn refresh_failures_do_not_fail_the_write() {
        let store = MockDocumentStore::new().failing_refresh();
        let r = reconciler(store.clone());

        let outcome = r
            .apply(
                EventKind::Upsert,
                DocKind::Task,
                &json!({"id": "t1", "title": "Design review"}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.action, ReconcileAction::Upserted);
        assert!(store.document("tasks", "t1").is_some());
    }

    #[tokio::test]
    async fn writes_trigger_an_index_refresh() {
        let store = MockDocumentStore::new();
        let r = reconciler(store.clone());

        r.apply(
            EventKind::Upsert,
            DocKind::Task,
            &json!({"id": "t1", "title": "Design review"}),
        )
        .await
        .unwrap();

        assert_eq!(store.refreshed(), vec!["tasks"]);
    }
}
