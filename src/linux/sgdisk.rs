use crate::entity::disk::{PartitionEnd, PartitionOp};
use crate::utils::shell::Cmd;

/// Commands that carry out `op` on `device`, in order.
///
/// ```shell
/// # WipeTable
/// sgdisk --zap-all {device}
/// sgdisk --clear {device}
///
/// # Delete
/// sgdisk --delete={n} {device}
///
/// # Create; start 0 and end 0 mean "first free" and "fill"
/// sgdisk --new={n}:{start}:{end} --typecode={n}:{code} --change-name={n}:{label} {device}
/// ```
pub fn op_cmds(device: &str, op: &PartitionOp) -> Vec<Cmd> {
    match op {
        PartitionOp::WipeTable => vec![
            Cmd::new("sgdisk").args(["--zap-all", device]),
            Cmd::new("sgdisk").args(["--clear", device]),
        ],

        PartitionOp::Delete { number } => {
            vec![Cmd::new("sgdisk").arg(format!("--delete={number}")).arg(device)]
        }

        PartitionOp::Create {
            number,
            start,
            end,
            type_code,
            label,
        } => {
            let end = match end {
                PartitionEnd::Sector(sector) => sector.to_string(),
                PartitionEnd::Fill => "0".to_string(),
            };

            vec![Cmd::new("sgdisk")
                .arg(format!("--new={number}:{start}:{end}"))
                .arg(format!("--typecode={number}:{type_code}"))
                .arg(format!("--change-name={number}:{label}"))
                .arg(device)]
        }
    }
}

#[test]
fn test_op_cmds() {
    struct Test<'a> {
        op: PartitionOp,
        expected: Vec<&'a str>,
    }

    let tests = vec![
        Test {
            op: PartitionOp::WipeTable,
            expected: vec!["sgdisk --zap-all /dev/sda", "sgdisk --clear /dev/sda"],
        },
        Test {
            op: PartitionOp::Delete { number: 3 },
            expected: vec!["sgdisk --delete=3 /dev/sda"],
        },
        Test {
            op: PartitionOp::Create {
                number: 2,
                start: 2099200,
                end: PartitionEnd::Sector(316669951),
                type_code: "8309".into(),
                label: "root".into(),
            },
            expected: vec!["sgdisk --new=2:2099200:316669951 --typecode=2:8309 --change-name=2:root /dev/sda"],
        },
        Test {
            op: PartitionOp::Create {
                number: 9,
                start: 316669952,
                end: PartitionEnd::Fill,
                type_code: "8309".into(),
                label: "data".into(),
            },
            expected: vec!["sgdisk --new=9:316669952:0 --typecode=9:8309 --change-name=9:data /dev/sda"],
        },
    ];

    for test in tests {
        let result: Vec<String> = op_cmds("/dev/sda", &test.op)
            .iter()
            .map(|c| c.to_string())
            .collect();

        assert_eq!(test.expected, result);
    }
}
