//! Async driver executing [`TreeEffect`]s against a [`ProcessBackend`].
//!
//! Each backend effect runs as its own tokio task holding only the
//! backend handle and plain ids. Completions are applied to the tree one
//! at a time, in the order they finish.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, instrument};

use crate::application::tree::{
    CommitRequest, FetchRequest, Notification, ProcessTree, TreeEffect,
};
use crate::domain::ProcessNode;
use crate::infrastructure::ProcessBackend;

enum Completion {
    Fetch(FetchRequest, Result<Vec<ProcessNode>, String>),
    Commit(CommitRequest, Result<Vec<ProcessNode>, String>),
}

pub struct TreeDriver {
    backend: Arc<dyn ProcessBackend>,
    tasks: JoinSet<Completion>,
    notifications: Vec<Notification>,
    add_requests: Vec<ProcessNode>,
}

impl TreeDriver {
    pub fn new(backend: Arc<dyn ProcessBackend>) -> Self {
        Self {
            backend,
            tasks: JoinSet::new(),
            notifications: Vec::new(),
            add_requests: Vec::new(),
        }
    }

    /// Backend calls still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Drain the tree's effects: spawn backend calls, collect the rest.
    pub fn dispatch(&mut self, tree: &mut ProcessTree) -> usize {
        let mut spawned = 0;
        for effect in tree.drain_effects() {
            match effect {
                TreeEffect::FetchChildren(request) => {
                    let backend = Arc::clone(&self.backend);
                    self.tasks.spawn(async move {
                        let result = backend
                            .fetch_children(&request.parent)
                            .await
                            .map_err(|e| e.user_message());
                        Completion::Fetch(request, result)
                    });
                    spawned += 1;
                }
                TreeEffect::CommitReorder(request) => {
                    let backend = Arc::clone(&self.backend);
                    self.tasks.spawn(async move {
                        let result = backend
                            .commit_reorder(&request.parent, &request.ordered_ids)
                            .await
                            .map_err(|e| e.user_message());
                        Completion::Commit(request, result)
                    });
                    spawned += 1;
                }
                TreeEffect::Notify(notification) => self.notifications.push(notification),
                TreeEffect::AddSubprocess(process) => self.add_requests.push(process),
            }
        }
        spawned
    }

    /// Wait for the next completion and apply it. Returns false once
    /// nothing is in flight.
    pub async fn step(&mut self, tree: &mut ProcessTree) -> bool {
        self.dispatch(tree);
        let Some(joined) = self.tasks.join_next().await else {
            return false;
        };
        match joined {
            Ok(Completion::Fetch(request, result)) => {
                let outcome = tree.apply_fetch(&request, result);
                debug!("fetch {} -> {:?}", request.parent, outcome);
            }
            Ok(Completion::Commit(request, result)) => {
                let outcome = tree.apply_commit(&request, result);
                debug!("commit {} -> {:?}", request.parent, outcome);
            }
            Err(e) => error!("backend task failed: {}", e),
        }
        self.dispatch(tree);
        true
    }

    /// Apply completions until the tree is quiescent.
    #[instrument(level = "debug", skip_all)]
    pub async fn run_until_idle(&mut self, tree: &mut ProcessTree) {
        while self.step(tree).await {}
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn take_add_requests(&mut self) -> Vec<ProcessNode> {
        std::mem::take(&mut self.add_requests)
    }
}
