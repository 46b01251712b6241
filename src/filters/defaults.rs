use log::{info, warn};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::filters::buffer::{BufferError, FilterBuffer};
use crate::filters::fields::FilterCandidate;
use crate::filters::validator::{self, RejectReason};
use crate::models::filter::{FilterAction, FilterMatch, FilterRecord, PortDirection, Transport};

/// Errors while loading the factory default descriptor
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("factory defaults do not fit: {0}")]
    Buffer(#[from] BufferError),

    #[error("factory default filter {id} is not valid: {reason}")]
    Rejected { id: u8, reason: RejectReason },

    #[error("factory default list contains a sentinel entry at position {0}")]
    Sentinel(usize),
}

/// Minimal keep filters provisioned on the board: ARP, EAPOL, DHCP client, DNS replies and HTTP
pub fn board_defaults(capacity: usize) -> Result<FilterBuffer, BufferError> {
    let keep = |id, filter| FilterRecord::new(id, FilterAction::Keep, filter);
    FilterBuffer::from_records(
        capacity,
        [
            keep(0, FilterMatch::EthType { eth_type: 0x0806 }),
            keep(1, FilterMatch::EthType { eth_type: 0x888E }),
            keep(
                2,
                FilterMatch::Port {
                    port: 68,
                    direction: PortDirection::Destination,
                    transport: Transport::Udp,
                },
            ),
            keep(
                3,
                FilterMatch::Port {
                    port: 53,
                    direction: PortDirection::Source,
                    transport: Transport::Udp,
                },
            ),
            keep(
                4,
                FilterMatch::Port {
                    port: 80,
                    direction: PortDirection::Destination,
                    transport: Transport::Tcp,
                },
            ),
        ],
    )
}

/// Load the factory defaults from a JSON descriptor, or fall back to the board defaults
pub fn load_factory_defaults(
    path: Option<&Path>,
    capacity: usize,
) -> Result<FilterBuffer, DefaultsError> {
    let Some(path) = path else {
        info!("Using built-in board default filters");
        return Ok(board_defaults(capacity)?);
    };

    let content = fs::read_to_string(path)?;
    let records: Vec<FilterRecord> = serde_json::from_str(&content)?;

    let mut buffer = FilterBuffer::with_capacity(capacity);
    for (position, record) in records.into_iter().enumerate() {
        // the provisioned list obeys the same rules as an edited one
        let candidate =
            FilterCandidate::from_record(&record).ok_or(DefaultsError::Sentinel(position))?;
        validator::validate(&candidate, &buffer).map_err(|reason| DefaultsError::Rejected {
            id: record.id,
            reason,
        })?;
        if buffer.contains_id(record.id) {
            warn!("Factory default id {} appears more than once", record.id);
        }
        buffer.append(record)?;
    }

    if buffer.is_empty() {
        warn!("Factory default descriptor {} holds no filters", path.display());
    }
    info!(
        "Loaded {} factory default filters from {}",
        buffer.len(),
        path.display()
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn descriptor(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn board_defaults_are_keep_only() {
        let defaults = board_defaults(11).unwrap();
        assert_eq!(defaults.len(), 5);
        assert!(!defaults.contains_discard());
        let ids: Vec<_> = defaults.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn missing_path_uses_board_defaults() {
        let defaults = load_factory_defaults(None, 11).unwrap();
        assert_eq!(defaults, board_defaults(11).unwrap());
    }

    #[test]
    fn loads_descriptor_file() {
        let file = descriptor(
            r#"[
                {"id": 0, "action": "keep", "kind": "eth_type", "eth_type": 2054},
                {"id": 1, "action": "keep", "kind": "ip_type", "protocol": 17}
            ]"#,
        );
        let defaults = load_factory_defaults(Some(file.path()), 11).unwrap();
        assert_eq!(defaults.len(), 2);
        assert_eq!(
            defaults.to_vec()[1].filter,
            FilterMatch::IpType { protocol: 17 }
        );
    }

    #[test]
    fn rejects_mixed_actions() {
        let file = descriptor(
            r#"[
                {"id": 0, "action": "keep", "kind": "ip_type", "protocol": 6},
                {"id": 1, "action": "discard", "kind": "ip_type", "protocol": 17}
            ]"#,
        );
        let err = load_factory_defaults(Some(file.path()), 11).unwrap_err();
        assert!(matches!(
            err,
            DefaultsError::Rejected {
                id: 1,
                reason: RejectReason::ActionMismatch
            }
        ));
    }

    #[test]
    fn rejects_duplicates_and_overflow() {
        let file = descriptor(
            r#"[
                {"id": 0, "action": "keep", "kind": "ip_type", "protocol": 6},
                {"id": 1, "action": "keep", "kind": "ip_type", "protocol": 6}
            ]"#,
        );
        assert!(matches!(
            load_factory_defaults(Some(file.path()), 11),
            Err(DefaultsError::Rejected { .. })
        ));

        let file = descriptor(
            r#"[
                {"id": 0, "action": "keep", "kind": "ip_type", "protocol": 6},
                {"id": 1, "action": "keep", "kind": "ip_type", "protocol": 17}
            ]"#,
        );
        assert!(matches!(
            load_factory_defaults(Some(file.path()), 2),
            Err(DefaultsError::Buffer(BufferError::Full))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let file = descriptor("not json");
        assert!(matches!(
            load_factory_defaults(Some(file.path()), 11),
            Err(DefaultsError::Json(_))
        ));
    }
}
