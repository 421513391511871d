//! Scan queue ordering.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use rand::seq::SliceRandom;

use janitor_model::MediaRecord;

/// Episodes emitted after each movie when interleaving.
pub const EPISODES_PER_MOVIE: usize = 10;

/// Shuffles, then stably sorts by view count descending when a watch map is
/// available. Unwatched items trail in random order.
pub fn order_by_watch<R: Rng + ?Sized>(
    items: &mut [MediaRecord],
    watch_counts: &HashMap<String, u64>,
    rng: &mut R,
) {
    items.shuffle(rng);
    if !watch_counts.is_empty() {
        items.sort_by_key(|item| {
            std::cmp::Reverse(watch_counts.get(&item.path).copied().unwrap_or(0))
        });
    }
}

/// One movie, then up to [`EPISODES_PER_MOVIE`] episodes, repeated.
/// Leftovers of either list are appended.
pub fn interleave(
    movies: Vec<MediaRecord>,
    episodes: Vec<MediaRecord>,
) -> VecDeque<MediaRecord> {
    let mut queue = VecDeque::with_capacity(movies.len() + episodes.len());
    let mut movies = movies.into_iter();
    let mut episodes = episodes.into_iter().peekable();

    loop {
        match movies.next() {
            Some(movie) => queue.push_back(movie),
            None => {
                queue.extend(episodes);
                break;
            }
        }
        if episodes.peek().is_none() {
            queue.extend(movies);
            break;
        }
        queue.extend(episodes.by_ref().take(EPISODES_PER_MOVIE));
    }
    queue
}
