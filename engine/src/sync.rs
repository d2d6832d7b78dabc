// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Synchronization of declared configuration.
//!
//! A [`DesiredConfig`] producer declares an ordered list of [`Operation`]s, optionally after
//! reading the current device state through a [`ConfigReader`]. [`Client::synchronize`] runs them
//! in order and stops at the first failure; operations already run are not undone.

use async_trait::async_trait;
use gnmi::{GnmiTransport, Path};
use schema::Tree;
#[allow(unused)]
use tracing::{debug, error, info};

use crate::client::Client;
use crate::errors::SyncError;

/// What to do with a subtree that should no longer be configured
#[derive(Debug)]
pub enum Removal {
    /// Delete it
    Delete,
    /// Replace it with its schema default, for subtrees the device does not allow to delete
    ResetToDefault(Box<dyn Tree>),
}

/// One unit of declared configuration
#[derive(Debug)]
pub enum Operation {
    /// Overwrite the subtree at `path` with `tree`.
    Replace { path: Path, tree: Box<dyn Tree> },
    /// Make the subtree at `path` match `tree` with minimal writes, leaving anything under the
    /// `ignore` paths as it is.
    Edit {
        path: Path,
        tree: Box<dyn Tree>,
        ignore: Vec<Path>,
    },
    /// Remove the subtree at `path`.
    Delete { path: Path, removal: Removal },
}

impl Operation {
    pub fn replace(path: Path, tree: impl Tree + 'static) -> Self {
        Operation::Replace {
            path,
            tree: Box::new(tree),
        }
    }

    pub fn edit(path: Path, tree: impl Tree + 'static) -> Self {
        Operation::Edit {
            path,
            tree: Box::new(tree),
            ignore: vec![],
        }
    }

    /// An edit leaving the subtrees at `ignore` untouched
    pub fn edit_ignoring(path: Path, tree: impl Tree + 'static, ignore: Vec<Path>) -> Self {
        Operation::Edit {
            path,
            tree: Box::new(tree),
            ignore,
        }
    }

    #[must_use]
    pub fn delete(path: Path) -> Self {
        Operation::Delete {
            path,
            removal: Removal::Delete,
        }
    }

    pub fn reset(path: Path, default: impl Tree + 'static) -> Self {
        Operation::Delete {
            path,
            removal: Removal::ResetToDefault(Box::new(default)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Replace { .. } => "replace",
            Operation::Edit { .. } => "edit",
            Operation::Delete {
                removal: Removal::Delete,
                ..
            } => "delete",
            Operation::Delete {
                removal: Removal::ResetToDefault(_),
                ..
            } => "reset",
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Operation::Replace { path, .. }
            | Operation::Edit { path, .. }
            | Operation::Delete { path, .. } => path,
        }
    }
}

/// Read access to the device, for producers that need the current state to decide what to
/// declare.
#[async_trait]
pub trait ConfigReader: Send + Sync {
    /// The JSON configured at `path`; [`SyncError::ValueNil`] if there is none.
    async fn get_json(&self, path: &Path) -> Result<Vec<u8>, SyncError>;

    /// The configuration at `path` as a tree of the same type as `like`, or `None` if there is
    /// none.
    async fn read_like(
        &self,
        path: &Path,
        like: &dyn Tree,
    ) -> Result<Option<Box<dyn Tree>>, SyncError> {
        match self.get_json(path).await {
            Ok(json) => like
                .decode_like(&json)
                .map(Some)
                .map_err(|source| SyncError::Schema {
                    op: "Get",
                    path: path.to_string(),
                    source,
                }),
            Err(SyncError::ValueNil { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A producer of declared configuration
#[async_trait]
pub trait DesiredConfig: Send + Sync {
    async fn operations(&self, reader: &dyn ConfigReader) -> Result<Vec<Operation>, SyncError>;
}

#[async_trait]
impl<T: GnmiTransport> ConfigReader for Client<T> {
    async fn get_json(&self, path: &Path) -> Result<Vec<u8>, SyncError> {
        Client::get_json(self, path).await
    }
}

impl<T: GnmiTransport> Client<T> {
    /// Run the operations declared by `desired`, in order.
    pub async fn synchronize(&self, desired: &dyn DesiredConfig) -> Result<(), SyncError> {
        let operations = desired.operations(self).await?;
        info!("Synchronizing {} operations", operations.len());
        for (index, operation) in operations.iter().enumerate() {
            debug!(
                "Operation {index}: {} {}",
                operation.name(),
                operation.path()
            );
            self.run(operation).await.map_err(|source| {
                error!(
                    "Operation {index} ({} {}) failed: {source}",
                    operation.name(),
                    operation.path()
                );
                SyncError::Operation {
                    index,
                    op: operation.name(),
                    path: operation.path().to_string(),
                    source: Box::new(source),
                }
            })?;
        }
        info!("Synchronization complete");
        Ok(())
    }

    /// Run a single operation.
    pub async fn run(&self, operation: &Operation) -> Result<(), SyncError> {
        match operation {
            Operation::Replace { path, tree } => self.replace_subtree(path, tree.as_ref()).await,
            Operation::Edit { path, tree, ignore } => {
                self.edit(path, tree.as_ref(), ignore).await.map(|_| ())
            }
            Operation::Delete {
                path,
                removal: Removal::Delete,
            } => self.delete_subtree(path).await,
            Operation::Delete {
                path,
                removal: Removal::ResetToDefault(default),
            } => self.replace_subtree(path, default.as_ref()).await,
        }
    }
}
