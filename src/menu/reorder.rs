/// Move the item at `from` to position `to`, shifting the items between
/// them by one. Returns a new vector; the input is left untouched.
///
/// Out-of-range indices leave the order unchanged, so the result is always
/// a permutation of `order`.
pub fn move_item<T: Clone>(order: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = order.to_vec();
    move_item_in_place(&mut moved, from, to);
    moved
}

/// In-place variant of [`move_item`]. Returns `false` when an index is out
/// of range and nothing moved.
pub fn move_item_in_place<T>(order: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= order.len() || to >= order.len() {
        return false;
    }
    if from != to {
        let item = order.remove(from);
        order.insert(to, item);
    }
    true
}
