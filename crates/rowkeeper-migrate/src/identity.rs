//! Identity of the host running migrations.
//!
//! Every ledger row records which machine executed it. Lookups are best
//! effort: a host without a usable interface yields zero values instead of
//! failing the run.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who executed a migration, as stored in the ledger `who` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorIdentity {
    /// Hardware address packed big-endian into an integer.
    #[serde(rename = "MacAddress")]
    pub mac_address: u64,
    /// Local IP address.
    #[serde(rename = "IP")]
    pub ip: String,
}

/// Source of the executing host's identity.
pub trait HostIdentity {
    /// Returns the current identity. Never fails; unknown parts are zero.
    fn identity(&self) -> ExecutorIdentity;
}

/// Reads the identity from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl HostIdentity for SystemIdentity {
    fn identity(&self) -> ExecutorIdentity {
        ExecutorIdentity {
            mac_address: mac_u64(),
            ip: local_ip_address::local_ip()
                .map(|ip| ip.to_string())
                .unwrap_or_default(),
        }
    }
}

/// A fixed identity, for tests and offline tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity(pub ExecutorIdentity);

impl HostIdentity for StaticIdentity {
    fn identity(&self) -> ExecutorIdentity {
        self.0.clone()
    }
}

/// Returns the address of the first usable interface as an integer.
fn mac_u64() -> u64 {
    let interfaces = netdev::get_interfaces();
    debug!(count = interfaces.len(), "Listed network interfaces");

    first_usable(interfaces.iter().filter_map(|iface| {
        let mac = iface.mac_addr?;
        Some((iface.is_up(), iface.is_loopback(), mac.octets()))
    }))
}

/// Picks the first interface that is up, not loopback, and carries a
/// globally administered address.
fn first_usable(interfaces: impl IntoIterator<Item = (bool, bool, [u8; 6])>) -> u64 {
    interfaces
        .into_iter()
        .find(|(up, loopback, bytes)| *up && !*loopback && is_global(bytes))
        .map(|(_, _, bytes)| pack(&bytes))
        .unwrap_or(0)
}

/// Zero addresses belong to loopback; bit 1 of the first octet marks
/// locally administered ones.
fn is_global(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| *b != 0) && bytes.first().is_some_and(|b| b & 0x02 == 0)
}

/// Packs up to eight octets big-endian.
fn pack(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}
