/// Per-viewer stable ordering of the fundraising listing.
///
/// Every viewer sees the eligible teams in an order derived from
/// `fnv1a_32("{viewer_seed}|{team_key}")`, so the order is deterministic per
/// viewer, differs across viewers, and favors no team structurally.

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a over UTF-8 bytes.
pub fn fnv1a_32(input: &str) -> u32 {
    let mut hash = FNV_OFFSET;
    for byte in input.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Rank of one team for one viewer.
pub fn viewer_rank(seed: &str, team_key: &str) -> u32 {
    fnv1a_32(&format!("{seed}|{team_key}"))
}

/// Sort `items` ascending by the viewer's rank of each item's team key.
/// Ties (identical hashes) fall back to the key itself so the result is
/// total regardless of input order.
pub fn sort_for_viewer<T>(seed: &str, items: &mut [T], team_key: impl Fn(&T) -> String) {
    items.sort_by_cached_key(|item| {
        let key = team_key(item);
        (viewer_rank(seed, &key), key)
    });
}
