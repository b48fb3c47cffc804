/// Deterministic hash used to route a pagination id to a processing unit.
pub fn hash_pagination_key(key: impl AsRef<[u8]>) -> u64 {
    // 64-bit FNV-1a; must stay stable across releases or units lose their keys.
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    key.as_ref().iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

/// Routing barrier re-distributing records by pagination id.
///
/// All records sharing a pagination id map to the same unit, so every
/// store touched for that id is owned by exactly one unit at a time and
/// no cross-unit locking is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repartitioner {
    partitions: usize,
}

impl Repartitioner {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn partition_for(&self, pagination_id: &str) -> usize {
        (hash_pagination_key(pagination_id) % self.partitions as u64) as usize
    }
}
