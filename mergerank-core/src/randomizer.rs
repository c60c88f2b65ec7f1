/// Initial order randomization.
///
/// A session is shuffled exactly once, on its first start. Every later resume,
/// undo or replay reuses the stored order so cached answers reconstruct the
/// identical recursion path.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::ItemId;

/// Return `ids` in a uniformly random order (Fisher-Yates).
pub fn shuffled_order<R: Rng + ?Sized>(ids: &[ItemId], rng: &mut R) -> Vec<ItemId> {
    let mut order = ids.to_vec();
    order.shuffle(rng);
    order
}
