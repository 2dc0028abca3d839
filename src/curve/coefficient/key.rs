use std::sync::atomic::{
    AtomicU64,
    Ordering
};

/// 係數在最佳化後端中的識別碼。
pub type Key = u64;

static NEXT_KEY: AtomicU64 = AtomicU64::new(0);

/// Hands out process-unique keys. A key is never handed out twice, even after
/// the coefficient that owned it has been cleared.
pub fn next_key() -> Key {
    NEXT_KEY.fetch_add(1, Ordering::Relaxed)
}
