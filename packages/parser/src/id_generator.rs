use crate::ast::BlockKind;
use crc32fast::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static INSTANCE_COUNT: AtomicU64 = AtomicU64::new(0);

fn crc32_of(parts: &[&[u8]]) -> u32 {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

/// Generate a stable seed from a persisted document id using CRC32
pub fn get_document_seed(document_id: &str) -> String {
    let key = format!("script://{}", document_id);
    format!("{:08x}", crc32_of(&[key.as_bytes()]))
}

/// Allocates type-tagged block ids: `{kind}_{seed}_{n}`
///
/// Every block in a tree gets its id from here. A fresh allocator draws a
/// 64-bit seed from the clock, the process id and a process-wide instance
/// counter, so two allocators never hand out the same id.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    seed: String,
    count: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let instance = INSTANCE_COUNT.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();

        let high = crc32_of(&[&nanos.to_le_bytes(), &instance.to_le_bytes()]);
        let low = crc32_of(&[&pid.to_le_bytes(), &instance.to_le_bytes(), &nanos.to_be_bytes()]);

        Self::from_seed(format!("{:08x}{:08x}", high, low))
    }

    /// Deterministic allocator for re-deriving a document's tree from text
    pub fn for_document(document_id: &str) -> Self {
        Self::from_seed(get_document_seed(document_id))
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Next id for a node of `kind`
    pub fn allocate(&mut self, kind: BlockKind) -> String {
        self.count += 1;
        format!("{}_{}_{}", kind.prefix(), self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
