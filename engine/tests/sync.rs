// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end synchronization against an in-memory device

use gnmi::{Encoding, Path};
use pretty_assertions::assert_eq;
use schema::Tree;
use serde_json::json;
use swcfg_engine::{ApplyParamsBuilder, Client, SyncError, diff};
use test_utils::nxos::{SRC_IF_ITEMS, SrcIfItems, TIME_ITEMS, TimeItems, ntp_server};
use test_utils::{FakeDevice, block_on};
use tracing_test::traced_test;

fn path(p: &str) -> Path {
    Path::parse(p).unwrap()
}

async fn client(device: FakeDevice) -> Client<FakeDevice> {
    Client::negotiate(device, None, ApplyParamsBuilder::default().build().unwrap())
        .await
        .unwrap()
}

/// Read back `TIME_ITEMS`, nothing configured counting as an empty tree
async fn read_back(client: &Client<FakeDevice>) -> TimeItems {
    match client.get::<TimeItems>(&path(TIME_ITEMS)).await {
        Ok(time) => time,
        Err(SyncError::ValueNil { .. }) => TimeItems::default(),
        Err(e) => panic!("read back failed: {e}"),
    }
}

#[tokio::test]
#[traced_test]
async fn empty_source_interface_reads_as_nothing() {
    let device = FakeDevice::nxos().with_config_at(TIME_ITEMS, json!({"srcIf-items": {}}));
    let client = client(device).await;
    let err = client
        .get::<SrcIfItems>(&path(SRC_IF_ITEMS))
        .await
        .unwrap_err();
    assert!(err.is_value_nil(), "{err}");
}

#[tokio::test]
#[traced_test]
async fn removing_one_ntp_server_is_a_single_delete() {
    let observed =
        TimeItems::with_servers([ntp_server("147.204.9.202"), ntp_server("147.204.9.203")]);
    let device = FakeDevice::nxos()
        .with_config_at(TIME_ITEMS, serde_json::from_slice(&observed.to_json().unwrap()).unwrap());
    let client = client(device).await;

    let desired = TimeItems::with_servers([ntp_server("147.204.9.202")]);
    let delta = client.edit(&path(TIME_ITEMS), &desired, &[]).await.unwrap();
    assert_eq!(delta.len(), 1);

    let sets = client.transport().sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(
        client.transport().deleted_paths(),
        vec!["System/time-items/prov-items/NtpProvider-list[name=147.204.9.203]"]
    );
    assert!(sets[0].update.is_empty());
    assert_eq!(read_back(&client).await, desired);
}

#[tokio::test]
#[traced_test]
async fn large_edits_are_chunked() {
    let client = client(FakeDevice::nxos()).await;
    /* 9 servers with 5 non-key leaves each */
    let servers = (1..=9).map(|n| ntp_server(&format!("10.0.0.{n}")));
    let desired = TimeItems {
        admin_st: None,
        ..TimeItems::with_servers(servers)
    };
    let delta = client.edit(&path(TIME_ITEMS), &desired, &[]).await.unwrap();
    assert_eq!(delta.updates.len(), 45);

    let sizes: Vec<usize> = client
        .transport()
        .sets()
        .iter()
        .map(|s| s.update.len())
        .collect();
    assert_eq!(sizes, vec![20, 20, 5]);
    assert_eq!(read_back(&client).await, desired);
}

#[tokio::test]
#[traced_test]
async fn dry_run_leaves_the_device_alone() {
    let device = FakeDevice::nxos().with_config_at(SRC_IF_ITEMS, json!({"srcIf": "mgmt0"}));
    let params = ApplyParamsBuilder::default().dry_run(true).build().unwrap();
    let client = Client::negotiate(device, None, params).await.unwrap();

    let desired = TimeItems::with_servers([ntp_server("10.0.0.1")]);
    let delta = client.edit(&path(TIME_ITEMS), &desired, &[]).await.unwrap();
    assert!(!delta.is_empty());
    client.delete_subtree(&path(TIME_ITEMS)).await.unwrap();

    assert!(client.transport().sets().is_empty());
    assert_eq!(
        client.transport().config_at(SRC_IF_ITEMS),
        Some(json!({"srcIf": "mgmt0"}))
    );
}

#[test]
fn edits_converge_and_then_idle() {
    bolero::check!()
        .with_type::<(TimeItems, TimeItems)>()
        .for_each(|(initial, desired)| {
            block_on(async {
                let initial_json = serde_json::from_slice(&initial.to_json().unwrap()).unwrap();
                let device = FakeDevice::nxos().with_config_at(TIME_ITEMS, initial_json);
                let client = client(device).await;

                client.edit(&path(TIME_ITEMS), desired, &[]).await.unwrap();
                let converged = read_back(&client).await;
                let residue = diff(
                    &path(TIME_ITEMS),
                    &converged,
                    desired,
                    &[],
                    Encoding::JsonIetf,
                )
                .unwrap();
                assert!(residue.is_empty(), "left over:\n{residue}");

                let writes = client.transport().sets().len();
                let again = client.edit(&path(TIME_ITEMS), desired, &[]).await.unwrap();
                assert!(again.is_empty(), "second pass:\n{again}");
                assert_eq!(client.transport().sets().len(), writes);
            });
        });
}
