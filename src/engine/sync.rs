use std::sync::Arc;

use tokio::task::JoinHandle;

use super::roster::Roster;
use crate::domain::errors::RosterResult;
use crate::domain::repositories::{Collection, DocumentChange, Subscription};

/// Background task keeping a roster's snapshot in step with the store
///
/// Dropping the handle stops the task and releases both subscriptions.
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the task and waits for it to wind down
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Roster {
    /// Subscribes to both collections and applies every change to the snapshot
    ///
    /// Subscriptions are opened before the collections are re-read, so no
    /// change committed in between is missed. Changes delivered twice are
    /// dropped by revision.
    pub async fn watch(self: &Arc<Self>) -> RosterResult<SyncHandle> {
        let agents = self.store().subscribe(Collection::Agents);
        let missions = self.store().subscribe(Collection::Missions);
        self.reload().await?;

        let roster = Arc::clone(self);
        let task = tokio::spawn(run_sync(roster, agents, missions));
        tracing::info!("Roster sync started");

        Ok(SyncHandle { task })
    }
}

async fn run_sync(roster: Arc<Roster>, mut agents: Subscription, mut missions: Subscription) {
    loop {
        let change = tokio::select! {
            change = agents.recv() => change,
            change = missions.recv() => change,
        };

        let Some(change) = change else {
            tracing::warn!("Store change feed closed, roster sync stopped");
            return;
        };

        if let Err(e) = roster.apply_change(&change).await {
            tracing::warn!(
                error = %e,
                collection = %change.collection(),
                "Failed to apply change, resynchronising"
            );
            let resync = DocumentChange::Resync {
                collection: change.collection(),
            };
            if let Err(e) = roster.apply_change(&resync).await {
                tracing::error!(error = %e, "Resync failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::repositories::DocumentStore;
    use crate::infrastructure::repositories::MemoryDocumentStore;
    use serde_json::json;

    async fn eventually<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Condition not reached in time");
    }

    #[tokio::test]
    async fn external_writes_reach_the_snapshot() {
        let store = Arc::new(MemoryDocumentStore::new());
        let roster = Arc::new(Roster::load(store.clone()).await.unwrap());
        let handle = roster.watch().await.unwrap();
        assert!(handle.is_running());

        let id = store
            .create(
                Collection::Agents,
                json!({
                    "firstName": "Tali",
                    "lastName": "Zorah",
                    "matricule": "QM-003",
                    "contact": "",
                    "address": "",
                    "photoUrl": ""
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .await
            .unwrap();

        eventually(|| {
            let roster = roster.clone();
            async move { roster.agent(id).await.is_ok() }
        })
        .await;

        store.delete(Collection::Agents, id).await.unwrap();

        eventually(|| {
            let roster = roster.clone();
            async move { roster.agent(id).await.is_err() }
        })
        .await;

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn lagging_sync_recovers_by_resync() {
        let store = Arc::new(MemoryDocumentStore::with_change_buffer(1));
        let roster = Arc::new(Roster::load(store.clone()).await.unwrap());
        let _handle = roster.watch().await.unwrap();

        for n in 0..20 {
            store
                .create(
                    Collection::Agents,
                    json!({
                        "firstName": "Agent",
                        "lastName": format!("N{}", n),
                        "matricule": format!("M-{}", n),
                    })
                    .as_object()
                    .cloned()
                    .unwrap(),
                )
                .await
                .unwrap();
        }

        eventually(|| {
            let roster = roster.clone();
            async move { roster.agents().await.len() == 20 }
        })
        .await;
    }
}
