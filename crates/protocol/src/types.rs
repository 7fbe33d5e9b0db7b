use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current state of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "completing")]
    Completing,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "aborted")]
    Aborted,
    #[serde(rename = "expired")]
    Expired,
}

impl TransferStatus {
    /// Returns `true` for states that still hold spool data.
    pub fn is_live(self) -> bool {
        matches!(self, TransferStatus::Open | TransferStatus::Completing)
    }
}

/// Operator snapshot of a transfer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInfo {
    pub transfer_id: String,
    pub target_path: String,
    pub status: TransferStatus,
    pub received_bytes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_size: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

impl TransferInfo {
    /// Returns received bytes as a percentage of the declared size
    /// (0 when the size is unknown).
    pub fn percentage(&self) -> f64 {
        match self.declared_size {
            Some(size) if size > 0 => self.received_bytes as f64 / size as f64 * 100.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_string(&TransferStatus::Open).unwrap(),
            "\"open\""
        );
        assert_eq!(
            serde_json::to_string(&TransferStatus::Completing).unwrap(),
            "\"completing\""
        );
    }

    #[test]
    fn status_liveness() {
        assert!(TransferStatus::Open.is_live());
        assert!(TransferStatus::Completing.is_live());
        assert!(!TransferStatus::Completed.is_live());
        assert!(!TransferStatus::Aborted.is_live());
        assert!(!TransferStatus::Expired.is_live());
    }

    #[test]
    fn info_percentage() {
        let info = TransferInfo {
            transfer_id: "t1".into(),
            target_path: "backups/db.tar".into(),
            status: TransferStatus::Open,
            received_bytes: 50,
            declared_size: Some(200),
            expires_at: Utc::now(),
        };
        assert_eq!(info.percentage(), 25.0);
    }

    #[test]
    fn info_percentage_unknown_size() {
        let info = TransferInfo {
            transfer_id: "t1".into(),
            target_path: "backups/db.tar".into(),
            status: TransferStatus::Open,
            received_bytes: 50,
            declared_size: None,
            expires_at: Utc::now(),
        };
        assert_eq!(info.percentage(), 0.0);
    }

    #[test]
    fn info_omits_unknown_size() {
        let info = TransferInfo {
            transfer_id: "t1".into(),
            target_path: "a.bin".into(),
            status: TransferStatus::Open,
            received_bytes: 0,
            declared_size: None,
            expires_at: Utc::now(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("declaredSize"));
    }
}
