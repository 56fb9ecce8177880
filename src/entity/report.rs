use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::action::Action;
use super::disk::{DataPartitionDecision, Disk, PartitionOp};

#[derive(Debug)]
pub struct Report {
    pub actions: Vec<Action>,
    pub duration: Duration,
    pub dry_run: bool,
    pub decision: Option<DataPartitionDecision>,
    pub planned: Vec<PartitionOp>,
    pub mounts: Option<Mounts>,
    pub handoff: Option<DataHandoff>,
}

/// Filesystems left mounted for the downstream installer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mounts {
    pub efi: String,
    pub root: String,
    pub home: String,
}

/// The closed data volume, handed off by name to whatever runs next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHandoff {
    pub partition: String,
    pub mapper: String,
    pub subvolume: String,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "actions": self.actions,
            "elapsedTime": self.duration,
            "dryRun": self.dry_run,
            "decision": self.decision,
            "planned": self.planned,
            "mounts": self.mounts,
            "dataHandoff": self.handoff,
        })
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Outcome of the ZFS pool flow
#[derive(Debug)]
pub struct ZfsReport {
    pub actions: Vec<Action>,
    pub duration: Duration,
    pub dry_run: bool,
    pub pool: String,
    pub device: String,
    pub key_file: String,
}

impl ZfsReport {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "actions": self.actions,
            "elapsedTime": self.duration,
            "dryRun": self.dry_run,
            "pool": self.pool,
            "device": self.device,
            "keyFile": self.key_file,
        })
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Output of the read-only `plan` command
#[derive(Debug)]
pub struct Preview {
    pub disk: Disk,
    pub create: Vec<PartitionOp>,
    pub preserve: Option<Vec<PartitionOp>>,
}

impl Preview {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "disk": self.disk,
            "createOps": self.create,
            "preserveOps": self.preserve,
        })
    }
}

#[test]
fn test_report_json() {
    let report = Report {
        actions: vec![Action::CreateFs {
            device: "/dev/mapper/cryptroot".into(),
            fs_type: "btrfs".into(),
        }],
        duration: Duration::from_secs(20),
        dry_run: false,
        decision: Some(DataPartitionDecision::Create),
        planned: vec![PartitionOp::WipeTable],
        mounts: None,
        handoff: Some(DataHandoff {
            partition: "/dev/disk/by-id/X-part9".into(),
            mapper: "cryptdata".into(),
            subvolume: "@data".into(),
        }),
    };

    let value = report.to_json();
    assert_eq!("create", value["decision"]["decision"]);
    assert_eq!("btrfs", value["actions"][0]["createFilesystem"]["fs_type"]);
    assert_eq!("cryptdata", value["dataHandoff"]["mapper"]);
    assert_eq!("wipeTable", value["planned"][0]);
    assert!(value["mounts"].is_null());
}
