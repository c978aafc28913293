//! Stage 3: MMR diversification with genre slot allocation (§4.8).
//!
//! Two phases:
//!
//! - **Phase A** allocates the `n` output slots across the genres present
//!   in the candidate set. Each genre gets at least `min_per_genre` slots
//!   when there's room (`genres * min_per_genre <= n`), capped by its own
//!   candidate count; the remainder is distributed proportionally to
//!   candidate count by largest remainder. When there isn't room (genres
//!   outnumber what `min_per_genre` allows), every genre instead gets an
//!   equal `n / genres` base and the remainder goes to the genres with
//!   the highest candidate counts, ties broken lexicographically. Either
//!   way, a bucket is never assigned more slots than it has candidates —
//!   any slot that would overflow one bucket is handed to the next
//!   bucket with spare capacity instead.
//! - **Phase B** fills those slots in rounds: each round looks at every
//!   genre that still has slots owed to it, takes its current best
//!   remaining candidate by MMR score, and commits the single best of
//!   those across all genres, so no genre's pick locks in before it's
//!   been compared against every other genre's best candidate. If a
//!   genre's pool runs dry before its slots are used, leftover candidates
//!   from any genre fill the remainder unconstrained.

use std::collections::{BTreeMap, HashMap};

use crate::config::RankingConfig;
use crate::models::{ItemId, ScoredCandidate};

pub struct Diversifier {
    lambda: f64,
    min_per_genre: usize,
}

impl Diversifier {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            lambda: config.mmr_lambda,
            min_per_genre: config.min_per_genre,
        }
    }

    /// Select and order `n` candidates, returning each alongside the MMR
    /// score it was selected with (§6 `mmr` field).
    pub fn diversify(&self, candidates: Vec<ScoredCandidate>, n: usize) -> Vec<(ScoredCandidate, f64)> {
        if candidates.is_empty() || n == 0 {
            return Vec::new();
        }

        let mut buckets: BTreeMap<String, Vec<ScoredCandidate>> = BTreeMap::new();
        for candidate in candidates {
            buckets
                .entry(candidate.attrs.genre.clone())
                .or_default()
                .push(candidate);
        }
        for pool in buckets.values_mut() {
            pool.sort_by(|a, b| {
                b.scores
                    .composite
                    .total_cmp(&a.scores.composite)
                    .then_with(|| a.item_id.cmp(&b.item_id))
            });
        }

        let mut remaining_slots = self.allocate_slots(&buckets, n);
        let genres: Vec<String> = buckets.keys().cloned().collect();

        let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(n);
        let mut selected_mmr: Vec<f64> = Vec::with_capacity(n);

        while selected.len() < n {
            // One global pick per round: find each owed genre's current
            // best candidate, then take the single best of those against
            // the others, rather than locking in a genre's pick before
            // every other genre has had a chance to beat it.
            let mut best: Option<(String, usize, f64, f64, ItemId)> = None;
            for genre in &genres {
                if remaining_slots.get(genre).copied().unwrap_or(0) == 0 {
                    continue;
                }
                let pool = match buckets.get(genre) {
                    Some(pool) if !pool.is_empty() => pool,
                    _ => continue,
                };
                let Some(idx) = self.pick_best(pool, &selected) else {
                    continue;
                };
                let candidate = &pool[idx];
                let mmr = self.mmr_score(candidate, &selected);
                let rel = candidate.relevance();
                let item_id = candidate.item_id;
                let better = match &best {
                    None => true,
                    Some((_, _, best_mmr, best_rel, best_item_id)) => {
                        mmr > *best_mmr
                            || (mmr == *best_mmr && (rel, item_id) > (*best_rel, *best_item_id))
                    }
                };
                if better {
                    best = Some((genre.clone(), idx, mmr, rel, item_id));
                }
            }

            let Some((genre, idx, mmr, _, _)) = best else {
                break;
            };
            let pool = buckets.get_mut(&genre).expect("genre present in both maps");
            let candidate = pool.remove(idx);
            selected.push(candidate);
            selected_mmr.push(mmr);
            *remaining_slots.get_mut(&genre).unwrap() -= 1;
        }

        if selected.len() < n {
            let mut leftover: Vec<ScoredCandidate> = buckets.into_values().flatten().collect();
            while selected.len() < n {
                match self.pick_best(&leftover, &selected) {
                    Some(idx) => {
                        let candidate = leftover.remove(idx);
                        let mmr = self.mmr_score(&candidate, &selected);
                        selected.push(candidate);
                        selected_mmr.push(mmr);
                    }
                    None => break,
                }
            }
        }

        selected.into_iter().zip(selected_mmr).collect()
    }

    /// Index of the pool member with the highest MMR score against the
    /// already-selected set, breaking ties by relevance then item id.
    fn pick_best(&self, pool: &[ScoredCandidate], selected: &[ScoredCandidate]) -> Option<usize> {
        if pool.is_empty() {
            return None;
        }
        let mut best_idx = 0;
        let mut best_mmr = self.mmr_score(&pool[0], selected);
        for (idx, candidate) in pool.iter().enumerate().skip(1) {
            let mmr = self.mmr_score(candidate, selected);
            let better = mmr > best_mmr
                || (mmr == best_mmr
                    && (candidate.relevance(), candidate.item_id)
                        > (pool[best_idx].relevance(), pool[best_idx].item_id));
            if better {
                best_mmr = mmr;
                best_idx = idx;
            }
        }
        Some(best_idx)
    }

    fn mmr_score(&self, candidate: &ScoredCandidate, selected: &[ScoredCandidate]) -> f64 {
        let relevance = candidate.relevance();
        if selected.is_empty() {
            return self.lambda * relevance;
        }
        let max_sim = selected
            .iter()
            .map(|s| candidate.embedding.cosine_similarity(&s.embedding))
            .fold(f64::MIN, f64::max);
        self.lambda * relevance - (1.0 - self.lambda) * max_sim
    }

    /// Phase A: distribute `n` slots across `buckets.len()` genres (§4.8
    /// steps 3-5). A bucket is never assigned more slots than it has
    /// candidates — any slot that would overflow a bucket's capacity is
    /// handed to the next bucket with room instead.
    fn allocate_slots(
        &self,
        buckets: &BTreeMap<String, Vec<ScoredCandidate>>,
        n: usize,
    ) -> HashMap<String, usize> {
        let genre_count = buckets.len();
        if genre_count == 0 {
            return HashMap::new();
        }

        let pool_len: HashMap<String, usize> =
            buckets.iter().map(|(genre, pool)| (genre.clone(), pool.len())).collect();

        let mut allocation: HashMap<String, usize> =
            buckets.keys().map(|genre| (genre.clone(), 0)).collect();

        if genre_count * self.min_per_genre > n {
            // Overflow regime (step 5): equal base, then remainder to the
            // genres with the highest candidate counts, ties broken
            // lexicographically.
            let base = n / genre_count;
            for (genre, slots) in allocation.iter_mut() {
                *slots = base.min(pool_len[genre]);
            }

            let mut priority: Vec<String> = buckets.keys().cloned().collect();
            priority.sort_by(|a, b| pool_len[b].cmp(&pool_len[a]).then_with(|| a.cmp(b)));

            let assigned: usize = allocation.values().sum();
            let mut remaining = n.saturating_sub(assigned);

            // One slot per bucket per pass, in highest-count-first order —
            // `n mod genre_count` is always smaller than `genre_count`, so
            // a single pass places every remainder unless some buckets are
            // already saturated, in which case it wraps for the rest.
            while remaining > 0 {
                let mut placed_this_pass = false;
                for genre in &priority {
                    if remaining == 0 {
                        break;
                    }
                    let room = pool_len[genre] - allocation[genre];
                    if room == 0 {
                        continue;
                    }
                    *allocation.get_mut(genre).unwrap() += 1;
                    remaining -= 1;
                    placed_this_pass = true;
                }
                if !placed_this_pass {
                    break;
                }
            }
            return allocation;
        }

        // Normal regime (steps 3-4): `min_per_genre` base capped by bucket
        // size, remainder distributed proportionally to candidate count by
        // largest remainder.
        for (genre, slots) in allocation.iter_mut() {
            *slots = self.min_per_genre.min(pool_len[genre]);
        }

        let assigned: usize = allocation.values().sum();
        let remaining = n.saturating_sub(assigned);
        if remaining == 0 {
            return allocation;
        }

        let total_candidates: usize = pool_len.values().sum();
        if total_candidates == 0 {
            return allocation;
        }

        let shares: Vec<(String, f64)> = buckets
            .keys()
            .map(|genre| {
                let share = remaining as f64 * (pool_len[genre] as f64 / total_candidates as f64);
                (genre.clone(), share)
            })
            .collect();

        let mut to_distribute = remaining;
        for (genre, share) in &shares {
            let room = pool_len[genre] - allocation[genre];
            let grant = (share.floor() as usize).min(room);
            *allocation.get_mut(genre).unwrap() += grant;
            to_distribute -= grant;
        }

        // One slot each to the largest fractional remainders first, room
        // permitting.
        let mut by_fraction: Vec<&(String, f64)> = shares.iter().collect();
        by_fraction.sort_by(|a, b| b.1.fract().total_cmp(&a.1.fract()).then_with(|| a.0.cmp(&b.0)));
        for (genre, _) in by_fraction {
            if to_distribute == 0 {
                break;
            }
            let room = pool_len[genre] - allocation[genre];
            if room == 0 {
                continue;
            }
            *allocation.get_mut(genre).unwrap() += 1;
            to_distribute -= 1;
        }

        if to_distribute > 0 {
            // Some buckets hit their candidate-count ceiling before every
            // proportional slot could be placed; give the rest to whatever
            // bucket still has room, highest candidate count first.
            let mut priority: Vec<String> = buckets.keys().cloned().collect();
            priority.sort_by(|a, b| pool_len[b].cmp(&pool_len[a]).then_with(|| a.cmp(b)));
            for genre in &priority {
                if to_distribute == 0 {
                    break;
                }
                let room = pool_len[genre] - allocation[genre];
                let grant = room.min(to_distribute);
                *allocation.get_mut(genre).unwrap() += grant;
                to_distribute -= grant;
            }
        }

        allocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Embedding, ItemAttrs, ItemId, SignalScores};
    use uuid::Uuid;

    fn scored(genre: &str, composite: f64, embedding: Vec<f32>) -> ScoredCandidate {
        ScoredCandidate {
            item_id: ItemId::new(Uuid::new_v4()),
            attrs: ItemAttrs::new(Some(genre.to_string()), None, None, None, None),
            embedding: Embedding::new(embedding),
            scores: SignalScores {
                semantic: composite,
                popularity: 0.0,
                exploration: 0.0,
                freshness: 0.0,
                composite,
            },
            blended: composite,
        }
    }

    #[test]
    fn selects_exactly_n_when_enough_candidates() {
        let config = RankingConfig::default();
        let diversifier = Diversifier::new(&config);
        let candidates = vec![
            scored("rock", 0.9, vec![1.0, 0.0]),
            scored("rock", 0.8, vec![1.0, 0.0]),
            scored("jazz", 0.7, vec![0.0, 1.0]),
            scored("jazz", 0.6, vec![0.0, 1.0]),
        ];
        let result = diversifier.diversify(candidates, 3);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn duplicate_embeddings_get_spread_out_by_mmr() {
        let mut config = RankingConfig::default();
        config.min_per_genre = 1;
        let diversifier = Diversifier::new(&config);

        // Two near-duplicate high scorers, one diverse lower scorer.
        let candidates = vec![
            scored("rock", 0.95, vec![1.0, 0.0]),
            scored("rock", 0.94, vec![1.0, 0.01]),
            scored("rock", 0.50, vec![0.0, 1.0]),
        ];
        let result = diversifier.diversify(candidates, 2);
        assert_eq!(result.len(), 2);
        // The second pick should not be the near-duplicate of the first.
        let first_embedding = result[0].0.embedding.clone();
        let second_similarity = first_embedding.cosine_similarity(&result[1].0.embedding);
        assert!(second_similarity < 0.99);
    }

    #[test]
    fn guarantees_min_per_genre_when_room_allows() {
        let mut config = RankingConfig::default();
        config.min_per_genre = 2;
        let diversifier = Diversifier::new(&config);

        let candidates = vec![
            scored("rock", 0.95, vec![1.0, 0.0]),
            scored("rock", 0.90, vec![0.9, 0.1]),
            scored("rock", 0.85, vec![0.8, 0.2]),
            scored("jazz", 0.40, vec![0.0, 1.0]),
            scored("jazz", 0.35, vec![0.1, 0.9]),
        ];
        let result = diversifier.diversify(candidates, 4);
        let jazz_count = result
            .iter()
            .filter(|(c, _)| c.attrs.genre == "jazz")
            .count();
        assert!(jazz_count >= 2);
    }

    #[test]
    fn falls_back_to_equal_share_when_genres_outnumber_room() {
        let mut config = RankingConfig::default();
        config.min_per_genre = 5;
        let diversifier = Diversifier::new(&config);

        let candidates = vec![
            scored("rock", 0.9, vec![1.0, 0.0]),
            scored("jazz", 0.8, vec![0.0, 1.0]),
            scored("pop", 0.7, vec![0.5, 0.5]),
        ];
        // 3 genres * min_per_genre(5) = 15 > n(3), so each genre gets
        // floor(3/3) = 1 slot.
        let result = diversifier.diversify(candidates, 3);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn fills_remainder_unconstrained_when_a_genre_pool_runs_dry() {
        let mut config = RankingConfig::default();
        config.min_per_genre = 2;
        let diversifier = Diversifier::new(&config);

        let candidates = vec![
            scored("rock", 0.9, vec![1.0, 0.0]),
            scored("jazz", 0.8, vec![0.0, 1.0]),
            scored("jazz", 0.7, vec![0.1, 0.9]),
            scored("jazz", 0.6, vec![0.2, 0.8]),
        ];
        let result = diversifier.diversify(candidates, 4);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn small_genre_pool_is_capped_and_its_shortfall_goes_to_other_genres() {
        // pop/jazz have 10 candidates each, folk only 1. With
        // min_per_genre = 2 and n = 10, folk must not be allocated more
        // slots than it has candidates (1) even though its base share
        // would otherwise be 2 — the shortfall goes to pop/jazz instead.
        let mut config = RankingConfig::default();
        config.min_per_genre = 2;
        let diversifier = Diversifier::new(&config);

        let mut candidates = Vec::new();
        for i in 0..10 {
            candidates.push(scored("pop", 0.9 - i as f64 * 0.01, vec![1.0, 0.0]));
            candidates.push(scored("jazz", 0.8 - i as f64 * 0.01, vec![0.0, 1.0]));
        }
        candidates.push(scored("folk", 0.5, vec![1.0, 1.0]));

        let result = diversifier.diversify(candidates, 10);
        assert_eq!(result.len(), 10);
        let folk_count = result.iter().filter(|(c, _)| c.attrs.genre == "folk").count();
        assert_eq!(folk_count, 1);
    }

    #[test]
    fn overflow_regime_breaks_ties_by_candidate_count_then_genre_name() {
        // Genres outnumber the room (4 genres, min_per_genre = 1, n = 2),
        // so base is floor(2/4) = 0 for every genre and both remaining
        // slots go to the buckets with the most candidates: `a` (10
        // candidates) first, then a tie among b/c/d (1 candidate each)
        // broken lexicographically in favor of `b`.
        let mut config = RankingConfig::default();
        config.min_per_genre = 1;
        let diversifier = Diversifier::new(&config);

        let mut candidates = Vec::new();
        for i in 0..10 {
            candidates.push(scored("a", 0.5 - i as f64 * 0.01, vec![1.0, 0.0]));
        }
        candidates.push(scored("b", 0.4, vec![0.0, 1.0]));
        candidates.push(scored("c", 0.3, vec![0.5, 0.5]));
        candidates.push(scored("d", 0.2, vec![0.2, 0.8]));

        let result = diversifier.diversify(candidates, 2);
        assert_eq!(result.len(), 2);
        let genres: Vec<&str> = result.iter().map(|(c, _)| c.attrs.genre.as_str()).collect();
        assert!(genres.contains(&"a"));
        assert!(genres.contains(&"b"));
    }

    #[test]
    fn cross_bucket_round_picks_the_global_best_candidate_each_turn() {
        // jazz's best candidate (0.99) clearly outscores rock's two picks
        // (0.9, 0.89) on relevance alone, so a true cross-bucket round
        // should take it before rock gets a second pick, even though
        // "rock" sorts before "jazz" alphabetically.
        let mut config = RankingConfig::default();
        config.min_per_genre = 1;
        config.mmr_lambda = 1.0; // pure relevance, no similarity penalty
        let diversifier = Diversifier::new(&config);

        let candidates = vec![
            scored("rock", 0.9, vec![1.0, 0.0]),
            scored("rock", 0.89, vec![0.9, 0.1]),
            scored("jazz", 0.99, vec![0.0, 1.0]),
        ];
        let result = diversifier.diversify(candidates, 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0.attrs.genre, "jazz");
    }

    #[test]
    fn idempotent_when_run_twice_on_its_own_output() {
        let config = RankingConfig::default();
        let diversifier = Diversifier::new(&config);
        let candidates = vec![
            scored("rock", 0.9, vec![1.0, 0.0]),
            scored("jazz", 0.8, vec![0.0, 1.0]),
            scored("pop", 0.7, vec![0.5, 0.5]),
        ];
        let first: Vec<ScoredCandidate> = diversifier
            .diversify(candidates, 3)
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        let first_ids: Vec<_> = first.iter().map(|c| c.item_id).collect();

        let second: Vec<ScoredCandidate> = diversifier
            .diversify(first, 3)
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        let second_ids: Vec<_> = second.iter().map(|c| c.item_id).collect();

        assert_eq!(first_ids, second_ids);
    }

    proptest::proptest! {
        #[test]
        fn diversify_is_idempotent_on_its_own_output(
            composites in proptest::collection::vec(0.0f64..=1.0, 3..12),
            genre_idxs in proptest::collection::vec(0usize..3, 3..12),
        ) {
            let genres = ["rock", "jazz", "folk"];
            let n = composites.len().min(genre_idxs.len());
            let candidates: Vec<ScoredCandidate> = (0..n)
                .map(|i| {
                    scored(
                        genres[genre_idxs[i] % genres.len()],
                        composites[i],
                        vec![(i as f32).sin(), (i as f32).cos()],
                    )
                })
                .collect();

            let config = RankingConfig::default();
            let diversifier = Diversifier::new(&config);
            let target = (n / 2).max(1);

            let first: Vec<ScoredCandidate> = diversifier
                .diversify(candidates, target)
                .into_iter()
                .map(|(c, _)| c)
                .collect();
            let first_ids: Vec<_> = first.iter().map(|c| c.item_id).collect();

            let second: Vec<ScoredCandidate> = diversifier
                .diversify(first, target)
                .into_iter()
                .map(|(c, _)| c)
                .collect();
            let second_ids: Vec<_> = second.iter().map(|c| c.item_id).collect();

            prop_assert_eq!(first_ids, second_ids);
        }
    }
}
