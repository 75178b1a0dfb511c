//! StateManager - actor that owns the HubStore
//!
//! Processes commands via channels for thread-safe access to persistent state.

use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{
    BacklogFilter, BacklogItem, BacklogStatus, CompletedWorkPackage, EfficiencyMetrics, Filter, Inventory, Part,
    Personnel, Store, ToolRecord,
};

use super::messages::{StateCommand, StateError, StateResponse};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor
    pub fn spawn(store_path: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(store_path = %store_path.as_ref().display(), "spawn: called");
        let mut store = Store::open(store_path.as_ref())?;
        rebuild_all_indexes(&mut store)?;

        let (tx, rx) = mpsc::channel(256);

        // Spawn the actor task
        tokio::spawn(actor_loop(store, rx));

        info!("StateManager spawned");

        Ok(Self { tx })
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Backlog operations ===

    /// Add items in one batch, returning their ids
    pub async fn add_backlog_items(&self, items: Vec<BacklogItem>) -> StateResponse<Vec<String>> {
        debug!(count = items.len(), "add_backlog_items: called");
        self.request(|reply| StateCommand::AddBacklogItems { items, reply }).await
    }

    /// Get a backlog item by ID
    pub async fn get_backlog_item(&self, id: &str) -> StateResponse<Option<BacklogItem>> {
        debug!(%id, "get_backlog_item: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::GetBacklogItem { id, reply }).await
    }

    /// List backlog items in insertion order
    pub async fn list_backlog_items(&self, filter: BacklogFilter) -> StateResponse<Vec<BacklogItem>> {
        debug!(?filter, "list_backlog_items: called");
        self.request(|reply| StateCommand::ListBacklogItems { filter, reply }).await
    }

    /// Resolve an item by title
    ///
    /// A case-insensitive exact match wins over a substring match; within
    /// each tier the earliest inserted item is returned.
    pub async fn find_backlog_item_by_title(&self, title: &str) -> StateResponse<Option<BacklogItem>> {
        debug!(%title, "find_backlog_item_by_title: called");
        let title = title.to_string();
        self.request(|reply| StateCommand::FindBacklogItemByTitle { title, reply }).await
    }

    /// Set the status of an item, returning the updated item
    pub async fn update_backlog_status(&self, id: &str, status: BacklogStatus) -> StateResponse<BacklogItem> {
        debug!(%id, %status, "update_backlog_status: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::UpdateBacklogStatus { id, status, reply })
            .await
    }

    /// Number of backlog items
    pub async fn count_backlog_items(&self) -> StateResponse<usize> {
        debug!("count_backlog_items: called");
        self.request(|reply| StateCommand::CountBacklogItems { reply }).await
    }

    // === Inventory operations ===

    /// Insert or replace personnel, tools and parts
    pub async fn upsert_inventory(&self, inventory: Inventory) -> StateResponse<usize> {
        debug!(
            personnel = inventory.personnel.len(),
            tools = inventory.tools.len(),
            parts = inventory.parts.len(),
            "upsert_inventory: called"
        );
        self.request(|reply| StateCommand::UpsertInventory { inventory, reply }).await
    }

    /// Snapshot of all inventory collections
    pub async fn inventory(&self) -> StateResponse<Inventory> {
        debug!("inventory: called");
        self.request(|reply| StateCommand::GetInventory { reply }).await
    }

    // === Analytics operations ===

    /// Record a completed work package
    pub async fn add_completed(&self, record: CompletedWorkPackage) -> StateResponse<String> {
        debug!(id = %record.id, "add_completed: called");
        self.request(|reply| StateCommand::AddCompleted { record, reply }).await
    }

    /// List completed work packages, optionally for one sprint
    pub async fn list_completed(&self, sprint_id: Option<String>) -> StateResponse<Vec<CompletedWorkPackage>> {
        debug!(?sprint_id, "list_completed: called");
        self.request(|reply| StateCommand::ListCompleted { sprint_id, reply }).await
    }

    /// Efficiency metrics over every completed work package
    pub async fn efficiency_metrics(&self) -> StateResponse<EfficiencyMetrics> {
        debug!("efficiency_metrics: called");
        let completed = self.list_completed(None).await?;
        Ok(EfficiencyMetrics::compute(&completed))
    }

    // === Sync operations ===

    /// Rebuild the SQLite cache from the JSONL logs
    pub async fn sync(&self) -> StateResponse<()> {
        debug!("sync: called");
        self.request(|reply| StateCommand::Sync { reply }).await
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

fn rebuild_all_indexes(store: &mut Store) -> hubstore::StoreResult<()> {
    let backlog_count = store.rebuild_indexes::<BacklogItem>()?;
    let personnel_count = store.rebuild_indexes::<Personnel>()?;
    let tool_count = store.rebuild_indexes::<ToolRecord>()?;
    let part_count = store.rebuild_indexes::<Part>()?;
    let completed_count = store.rebuild_indexes::<CompletedWorkPackage>()?;
    info!(
        backlog_count,
        personnel_count, tool_count, part_count, completed_count, "Rebuilt indexes for all record types"
    );
    Ok(())
}

fn store_err(e: hubstore::StoreError) -> StateError {
    StateError::StoreError(e.to_string())
}

fn find_by_title(items: Vec<BacklogItem>, title: &str) -> Option<BacklogItem> {
    let needle = title.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let exact = items.iter().position(|i| i.title.trim().to_lowercase() == needle);
    let index = exact.or_else(|| items.iter().position(|i| i.title.to_lowercase().contains(&needle)))?;
    items.into_iter().nth(index)
}

fn upsert_inventory(store: &mut Store, inventory: Inventory) -> hubstore::StoreResult<usize> {
    let now = hubstore::now_ms();
    let mut count = 0;
    for mut p in inventory.personnel {
        p.updated_at = now;
        store.update(p)?;
        count += 1;
    }
    for mut t in inventory.tools {
        t.updated_at = now;
        store.update(t)?;
        count += 1;
    }
    for mut p in inventory.parts {
        p.updated_at = now;
        store.update(p)?;
        count += 1;
    }
    Ok(count)
}

fn load_inventory(store: &Store) -> hubstore::StoreResult<Inventory> {
    Ok(Inventory {
        personnel: store.list(&[])?,
        tools: store.list(&[])?,
        parts: store.list(&[])?,
    })
}

/// Actor loop that processes commands
async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            // Backlog operations
            StateCommand::AddBacklogItems { items, reply } => {
                debug!(count = items.len(), "actor_loop: AddBacklogItems command");
                let result = store.create_many(items).map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::GetBacklogItem { id, reply } => {
                debug!(%id, "actor_loop: GetBacklogItem command");
                let result: StateResponse<Option<BacklogItem>> = store.get(&id).map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::ListBacklogItems { filter, reply } => {
                debug!(?filter, "actor_loop: ListBacklogItems command");
                let result: StateResponse<Vec<BacklogItem>> = store.list(&filter.to_filters()).map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::FindBacklogItemByTitle { title, reply } => {
                debug!(%title, "actor_loop: FindBacklogItemByTitle command");
                let result = store
                    .list::<BacklogItem>(&[])
                    .map(|items| find_by_title(items, &title))
                    .map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::UpdateBacklogStatus { id, status, reply } => {
                debug!(%id, %status, "actor_loop: UpdateBacklogStatus command");
                let result = match store.get::<BacklogItem>(&id) {
                    Ok(Some(mut item)) => {
                        item.set_status(status);
                        store.update(item.clone()).map(|_| item).map_err(store_err)
                    }
                    Ok(None) => {
                        debug!(%id, "actor_loop: UpdateBacklogStatus item not found");
                        Err(StateError::NotFound(id))
                    }
                    Err(e) => Err(store_err(e)),
                };
                let _ = reply.send(result);
            }

            StateCommand::CountBacklogItems { reply } => {
                debug!("actor_loop: CountBacklogItems command");
                let result = store.count::<BacklogItem>().map_err(store_err);
                let _ = reply.send(result);
            }

            // Inventory operations
            StateCommand::UpsertInventory { inventory, reply } => {
                debug!("actor_loop: UpsertInventory command");
                let result = upsert_inventory(&mut store, inventory).map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::GetInventory { reply } => {
                debug!("actor_loop: GetInventory command");
                let result = load_inventory(&store).map_err(store_err);
                let _ = reply.send(result);
            }

            // Analytics operations
            StateCommand::AddCompleted { mut record, reply } => {
                debug!(id = %record.id, "actor_loop: AddCompleted command");
                record.updated_at = hubstore::now_ms();
                let result = store.create(record).map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::ListCompleted { sprint_id, reply } => {
                debug!(?sprint_id, "actor_loop: ListCompleted command");
                let filters: Vec<Filter> = sprint_id.map(|s| Filter::eq("sprint_id", s)).into_iter().collect();
                let result: StateResponse<Vec<CompletedWorkPackage>> = store.list(&filters).map_err(store_err);
                let _ = reply.send(result);
            }

            // Sync operations
            StateCommand::Sync { reply } => {
                debug!("actor_loop: Sync command");
                let result = store
                    .sync()
                    .and_then(|_| rebuild_all_indexes(&mut store))
                    .map_err(store_err);
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}
