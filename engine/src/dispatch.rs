// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Write dispatcher.
//!
//! Devices cap the size of a Set request, so a [`Delta`] is written in chunks of at most
//! [`ApplyParams::max_paths_per_request`] paths, one Set per chunk: all deletes first, then all
//! updates. Chunks go out sequentially and the first failure aborts the rest; chunks already
//! written stay written. In dry-run mode nothing is sent and every write is logged instead.

use gnmi::proto::{SetRequest, Update};
use gnmi::{GnmiError, GnmiTransport, Path, proto};
#[allow(unused)]
use tracing::{debug, error, info, warn};

use crate::delta::{Delta, PathUpdate};
use crate::errors::SyncError;
use crate::params::ApplyParams;

pub struct Dispatcher<'a, T: ?Sized> {
    transport: &'a T,
    params: &'a ApplyParams,
}

fn set_update(update: &PathUpdate) -> Update {
    Update {
        path: Some(proto::Path::from(&update.path)),
        val: Some(update.value.clone()),
        duplicates: 0,
    }
}

impl<'a, T: GnmiTransport + ?Sized> Dispatcher<'a, T> {
    pub fn new(transport: &'a T, params: &'a ApplyParams) -> Self {
        Self { transport, params }
    }

    /// Write `delta`, deletes first.
    pub async fn apply(&self, delta: &Delta) -> Result<(), SyncError> {
        if delta.is_empty() {
            debug!("Nothing to write");
            return Ok(());
        }
        let size = self.params.max_paths_per_request.max(1);
        let deletes = delta.deletes.chunks(size);
        let updates = delta.updates.chunks(size);
        let total = deletes.len() + updates.len();
        debug!(
            "Writing {} deletes and {} updates in {total} requests",
            delta.deletes.len(),
            delta.updates.len()
        );

        let mut chunk = 0;
        for paths in deletes {
            chunk += 1;
            let request = SetRequest {
                delete: paths.iter().map(proto::Path::from).collect(),
                ..Default::default()
            };
            self.send_chunk(chunk, total, "delete", &paths[0], request)
                .await?;
        }
        for batch in updates {
            chunk += 1;
            let request = SetRequest {
                update: batch.iter().map(set_update).collect(),
                ..Default::default()
            };
            self.send_chunk(chunk, total, "update", &batch[0].path, request)
                .await?;
        }
        Ok(())
    }

    /// Replace the subtree at `path` with `value`, in a single request.
    pub async fn replace(&self, path: &Path, value: proto::TypedValue) -> Result<(), SyncError> {
        let request = SetRequest {
            replace: vec![Update {
                path: Some(proto::Path::from(path)),
                val: Some(value),
                duplicates: 0,
            }],
            ..Default::default()
        };
        self.send(path, request).await
    }

    /// Delete the subtree at `path`.
    pub async fn delete(&self, path: &Path) -> Result<(), SyncError> {
        let request = SetRequest {
            delete: vec![proto::Path::from(path)],
            ..Default::default()
        };
        self.send(path, request).await
    }

    async fn send(&self, path: &Path, request: SetRequest) -> Result<(), SyncError> {
        if self.params.dry_run {
            log_dry_run(&request);
            return Ok(());
        }
        self.transport
            .set(request)
            .await
            .map_err(|status| {
                error!("Write at {path} failed: {status}");
                GnmiError::from_status("Set", path.to_string(), status)
            })?;
        Ok(())
    }

    async fn send_chunk(
        &self,
        chunk: usize,
        total: usize,
        what: &'static str,
        first: &Path,
        request: SetRequest,
    ) -> Result<(), SyncError> {
        if self.params.dry_run {
            info!("Dry run: request {chunk}/{total} ({what})");
            log_dry_run(&request);
            return Ok(());
        }
        match self.transport.set(request).await {
            Ok(_) => {
                debug!("Request {chunk}/{total} ({what}) succeeded");
                Ok(())
            }
            Err(status) => {
                error!("Request {chunk}/{total} ({what} from {first}) failed: {status}");
                if chunk > 1 {
                    warn!("{} earlier requests were applied and are not rolled back", chunk - 1);
                }
                Err(SyncError::Apply {
                    chunk,
                    total,
                    what,
                    first: first.to_string(),
                    source: GnmiError::from_status("Set", first.to_string(), status),
                })
            }
        }
    }
}

fn log_dry_run(request: &SetRequest) {
    let show = |path: Option<&proto::Path>| {
        path.and_then(|p| Path::try_from(p).ok())
            .map_or_else(|| "<bad path>".to_string(), |p| p.to_string())
    };
    for path in &request.delete {
        info!("Dry run: delete {}", show(Some(path)));
    }
    for update in &request.replace {
        info!("Dry run: replace {}", show(update.path.as_ref()));
    }
    for update in &request.update {
        let value = PathUpdate {
            path: Path::root(),
            value: update.val.clone().unwrap_or_default(),
        }
        .value_text();
        info!("Dry run: update {} = {value}", show(update.path.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::Dispatcher;
    use crate::delta::{Delta, PathUpdate};
    use crate::errors::SyncError;
    use crate::params::ApplyParamsBuilder;
    use gnmi::{Encoding, Path};
    use pretty_assertions::assert_eq;
    use test_utils::FakeDevice;
    use tonic::Status;
    use tracing_test::traced_test;

    fn delta(deletes: usize, updates: usize) -> Delta {
        let base = Path::parse("System/time-items/prov-items").unwrap();
        let entry = |n: usize| {
            base.entry(
                "NtpProvider-list",
                [("name".to_string(), format!("10.0.0.{n}"))].into(),
            )
        };
        Delta {
            deletes: (0..deletes).map(entry).collect(),
            updates: (0..updates)
                .map(|n| PathUpdate {
                    path: entry(100 + n).child("vrf"),
                    value: Encoding::JsonIetf.encode(br#""management""#.to_vec()),
                })
                .collect(),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn chunks_deletes_before_updates() {
        let device = FakeDevice::nxos();
        let params = ApplyParamsBuilder::default().build().unwrap();
        Dispatcher::new(&device, &params)
            .apply(&delta(3, 45))
            .await
            .unwrap();

        let sets = device.sets();
        assert_eq!(sets.len(), 4);
        assert_eq!(sets[0].delete.len(), 3);
        assert!(sets[0].update.is_empty());
        let sizes: Vec<usize> = sets[1..].iter().map(|s| s.update.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert!(sets[1..].iter().all(|s| s.delete.is_empty()));
    }

    #[tokio::test]
    #[traced_test]
    async fn empty_delta_sends_nothing() {
        let device = FakeDevice::nxos();
        let params = ApplyParamsBuilder::default().build().unwrap();
        Dispatcher::new(&device, &params)
            .apply(&Delta::default())
            .await
            .unwrap();
        assert!(device.sets().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn stops_at_first_failure() {
        let device = FakeDevice::nxos();
        device.fail_set(2, Status::invalid_argument("bad value"));
        let params = ApplyParamsBuilder::default()
            .max_paths_per_request(10)
            .build()
            .unwrap();
        let err = Dispatcher::new(&device, &params)
            .apply(&delta(0, 45))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SyncError::Apply { chunk: 2, total: 5, what: "update", .. }),
            "{err}"
        );
        assert_eq!(device.sets().len(), 2);
        assert!(logs_contain("1 earlier requests were applied"));
    }

    #[tokio::test]
    #[traced_test]
    async fn dry_run_sends_nothing() {
        let device = FakeDevice::nxos();
        let params = ApplyParamsBuilder::default().dry_run(true).build().unwrap();
        let dispatcher = Dispatcher::new(&device, &params);
        dispatcher.apply(&delta(1, 1)).await.unwrap();
        dispatcher
            .delete(&Path::parse("System/time-items").unwrap())
            .await
            .unwrap();
        assert!(device.sets().is_empty());
        assert!(logs_contain(
            "Dry run: delete System/time-items/prov-items/NtpProvider-list[name=10.0.0.0]"
        ));
        assert!(logs_contain(r#"= "management""#));
        assert!(logs_contain("Dry run: delete System/time-items"));
    }
}
