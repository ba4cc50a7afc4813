//! Command execution; each command yields JSON lines for stdout

use binlog_index::{EventDataInfo, EventIndex, Gtid, IndexError, OrderedStore, PostcardCodec};
use serde_json::{Value, json};

use crate::config::Command;

pub type CliIndex<S> = EventIndex<S, PostcardCodec<EventDataInfo>>;

fn found(gtid: &Gtid, record: &EventDataInfo) -> Value {
    json!({ "gtid": gtid.to_string(), "found": true, "record": record })
}

fn missing(key: &str) -> Value {
    json!({ "gtid": key, "found": false })
}

/// Run one command against an open index
pub fn run<S: OrderedStore>(index: &CliIndex<S>, command: Command) -> Result<Vec<Value>, IndexError> {
    let lines = match command {
        Command::Put {
            gtid,
            file,
            offset,
            length,
            checksum,
        } => {
            let record = EventDataInfo::new(file, offset, length).with_checksum(checksum);
            index.upsert(&gtid, &record)?;
            vec![json!({ "gtid": gtid, "stored": true })]
        }
        Command::Get { gtid } => match index.get_exact_entry(&gtid)? {
            Some((landed, record)) => vec![found(&landed, &record)],
            None => vec![missing(&gtid)],
        },
        Command::LowerBound { gtid } => match index.get_lower_bound_entry(&gtid)? {
            Some((landed, record)) => vec![found(&landed, &record)],
            None => vec![missing(&gtid)],
        },
        Command::Latest { origin } => match index.latest_for_origin(&origin)? {
            Some((landed, record)) => vec![found(&landed, &record)],
            None => vec![json!({ "origin": origin, "found": false })],
        },
        Command::Exists { gtid } => {
            let exists = index.exists(&gtid)?;
            vec![json!({ "gtid": gtid, "exists": exists })]
        }
        Command::Delete { gtid } => {
            index.delete(&gtid)?;
            vec![json!({ "gtid": gtid, "deleted": true })]
        }
        Command::Scan { origin, limit } => index
            .scan_origin(&origin, limit)?
            .iter()
            .map(|(gtid, record)| found(gtid, record))
            .collect(),
    };
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use binlog_index::InMemoryStore;

    fn create_test_index() -> CliIndex<InMemoryStore> {
        EventIndex::with_store(InMemoryStore::new(), PostcardCodec::new())
    }

    fn put(index: &CliIndex<InMemoryStore>, gtid: &str, offset: u64) {
        run(
            index,
            Command::Put {
                gtid: gtid.to_string(),
                file: "binlog.000001".to_string(),
                offset,
                length: 10,
                checksum: 0,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_lower_bound_reports_landed_gtid() {
        let index = create_test_index();
        put(&index, "A:3", 30);

        let lines = run(&index, Command::LowerBound { gtid: "A:2".into() }).unwrap();
        assert_eq!(lines[0]["gtid"], "A:3");
        assert_eq!(lines[0]["record"]["offset"], 30);

        let lines = run(&index, Command::Get { gtid: "A:2".into() }).unwrap();
        assert_eq!(lines[0]["found"], false);
    }

    #[test]
    fn test_delete_then_exists() {
        let index = create_test_index();
        put(&index, "A:1", 1);

        run(&index, Command::Delete { gtid: "A:1".into() }).unwrap();
        let lines = run(&index, Command::Exists { gtid: "A:1".into() }).unwrap();
        assert_eq!(lines[0]["exists"], false);
    }

    #[test]
    fn test_scan_and_latest() {
        let index = create_test_index();
        for seq in [1, 2, 10] {
            put(&index, &format!("A:{seq}"), seq);
        }

        let lines = run(
            &index,
            Command::Scan {
                origin: "A".into(),
                limit: 2,
            },
        )
        .unwrap();
        assert_eq!(lines.len(), 2);

        let lines = run(&index, Command::Latest { origin: "A".into() }).unwrap();
        assert_eq!(lines[0]["gtid"], "A:10");
    }

    #[test]
    fn test_invalid_gtid_is_an_error() {
        let index = create_test_index();
        let err = run(&index, Command::Get { gtid: "nope".into() }).unwrap_err();
        assert!(matches!(err, IndexError::InvalidGtid(_)));
    }
}
