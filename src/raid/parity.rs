//! XOR parity over zero-padded blocks

/// XOR `block` into `acc`
///
/// `block` may be shorter than `acc`; the missing tail behaves as zeros,
/// so short final blocks never need an explicit padded copy.
pub fn xor_into(acc: &mut [u8], block: &[u8]) {
    debug_assert!(block.len() <= acc.len());
    for (a, b) in acc.iter_mut().zip(block) {
        *a ^= b;
    }
}

/// XOR of every block, each padded to `block_size`
pub fn parity_of<'a, I>(blocks: I, block_size: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut parity = vec![0u8; block_size];
    for block in blocks {
        xor_into(&mut parity, block);
    }
    parity
}
