use std::collections::HashMap;

use crate::speed::NetworkCounters;

/// One entry of `GET /containers/json`.
///
/// The endpoint reports far more fields; only the id is needed here and serde
/// ignores the rest.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
}

/// Per-interface counters inside a stats response.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct InterfaceCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Response of `GET /containers/{id}/stats?stream=false&one-shot=true`.
///
/// `networks` is absent for containers without network namespaces (e.g.,
/// host-mode networking), which decodes as an empty map.
#[derive(Debug, Default, serde::Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub networks: HashMap<String, InterfaceCounters>,
}

impl StatsResponse {
    /// Sums the counters of every reported interface into one figure.
    ///
    /// Containers routinely carry multiple virtual interfaces; they are
    /// intentionally aggregated into a single RX/TX pair per container.
    pub fn total_counters(&self) -> NetworkCounters {
        let mut total = NetworkCounters::default();
        for counters in self.networks.values() {
            total += NetworkCounters {
                rx_bytes: counters.rx_bytes,
                tx_bytes: counters.tx_bytes,
            };
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_container_list() {
        let data = r#"[
            {"Id": "abc123", "Names": ["/vpn-1"], "State": "running"},
            {"Id": "def456", "Names": ["/vpn-2"], "State": "running"}
        ]"#;
        let summaries: Vec<ContainerSummary> = serde_json::from_str(data).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "abc123");
        assert_eq!(summaries[1].id, "def456");
    }

    #[test]
    fn test_decode_stats_sums_interfaces() {
        let data = r#"{
            "read": "2026-08-26T12:00:00Z",
            "networks": {
                "eth0": {"rx_bytes": 1000, "rx_packets": 10, "tx_bytes": 500, "tx_packets": 5},
                "eth1": {"rx_bytes": 200, "rx_packets": 2, "tx_bytes": 100, "tx_packets": 1}
            }
        }"#;
        let stats: StatsResponse = serde_json::from_str(data).unwrap();
        let total = stats.total_counters();
        assert_eq!(total.rx_bytes, 1200);
        assert_eq!(total.tx_bytes, 600);
    }

    #[test]
    fn test_decode_stats_without_networks() {
        let data = r#"{"read": "2026-08-26T12:00:00Z"}"#;
        let stats: StatsResponse = serde_json::from_str(data).unwrap();
        assert_eq!(stats.total_counters(), NetworkCounters::default());
    }
}
