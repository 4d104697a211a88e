//! Two-pass chunked shuffle.
//!
//! Batches are shuffled within small chunks first, then the chunk order is
//! lightly reshuffled. This breaks up instrument runs without letting a
//! carefully front-loaded batch composition drift entirely to the back.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::catalog::Item;

/// Chunk size used by stage batch shuffles.
pub const SHUFFLE_CHUNK: usize = 5;

/// Shuffles within fixed-size chunks, then lightly reshuffles chunk order
/// by one pass of random adjacent chunk swaps.
pub fn two_pass_shuffle<R: Rng>(items: &mut Vec<Item>, chunk_size: usize, rng: &mut R) {
    if items.len() < 2 || chunk_size == 0 {
        return;
    }

    for chunk in items.chunks_mut(chunk_size) {
        chunk.shuffle(rng);
    }

    let chunk_count = (items.len() + chunk_size - 1) / chunk_size;
    if chunk_count < 2 {
        return;
    }

    // Light pass: each adjacent chunk pair may swap once. Only full-size
    // chunks participate so a short tail chunk stays last.
    let mut chunks: Vec<Vec<Item>> = items.chunks(chunk_size).map(|c| c.to_vec()).collect();
    let full = items.len() / chunk_size;
    for i in 1..full {
        if rng.gen_bool(0.5) {
            chunks.swap(i - 1, i);
        }
    }

    items.clear();
    items.extend(chunks.into_iter().flatten());
}
