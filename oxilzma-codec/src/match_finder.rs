//! Match finding for the LZMA encoder.
//!
//! A [`MatchFinder`] looks at the input at one position and proposes the next
//! [`Decision`]: a literal, a short rep, a repeat of one of the four recent
//! distances, or a fresh match. The encoder turns decisions into range-coded
//! symbols; the finder never touches the coder.
//!
//! Distances are zero-based: distance `0` copies from the previous byte.
//! Every proposed distance stays below both the bytes available before the
//! current position and the dictionary size, which are exactly the limits the
//! decoder enforces.
//!
//! Available strategies:
//! - [`GreedyFinder`]: hash chains, takes the best match at each position
//! - [`LazyFinder`]: hash chains with one-step lookahead
//! - [`LiteralFinder`]: no search at all

use crate::config::MatchStrategy;
use crate::model::{MATCH_LEN_MAX, MATCH_LEN_MIN};

/// Hash table size (64K entries).
const HASH_SIZE: usize = 1 << 16;

/// Empty hash slot / end of chain.
const NIL: u32 = u32::MAX;

/// One coding decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Code the current byte as a literal.
    Literal,
    /// Copy one byte from rep0.
    ShortRep,
    /// Copy `len` bytes from repeat distance `index` (0..=3).
    Rep {
        /// Index into the repeat distances.
        index: usize,
        /// Match length.
        len: usize,
    },
    /// Copy `len` bytes from a new distance.
    Match {
        /// Zero-based distance.
        distance: u32,
        /// Match length.
        len: usize,
    },
}

impl Decision {
    /// Number of input bytes the decision consumes.
    pub fn consumed(&self) -> usize {
        match *self {
            Decision::Literal | Decision::ShortRep => 1,
            Decision::Rep { len, .. } | Decision::Match { len, .. } => len,
        }
    }
}

/// What a finder sees at one position.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// Trained prefix followed by the input being coded.
    pub data: &'a [u8],
    /// Position of the next byte to code.
    pub pos: usize,
    /// Current repeat distances.
    pub reps: [u32; 4],
    /// Back-reference limit (`max(dictionary_size, 1)`).
    pub dictionary_size_check: u32,
}

impl SearchContext<'_> {
    /// Whether `distance` reaches data the decoder will have.
    #[inline]
    pub fn is_distance_valid(&self, distance: u32) -> bool {
        (distance as usize) < self.pos && distance < self.dictionary_size_check
    }

    /// Longest possible match here.
    #[inline]
    pub fn max_len(&self) -> usize {
        (self.data.len() - self.pos).min(MATCH_LEN_MAX)
    }

    /// Length of the match at `distance`, capped at `max_len`.
    #[inline]
    pub fn match_len(&self, distance: u32, max_len: usize) -> usize {
        let src = self.pos - distance as usize - 1;
        let data = self.data;
        let mut len = 0;
        while len < max_len && data[self.pos + len] == data[src + len] {
            len += 1;
        }
        len
    }
}

/// Strategy proposing the encoder's next decision.
pub trait MatchFinder: Send {
    /// Forget every indexed position.
    fn reset(&mut self);

    /// Index every position before `end` not indexed yet.
    ///
    /// The encoder calls this after each decision and once for the trained
    /// prefix before coding starts.
    fn advance(&mut self, data: &[u8], end: usize);

    /// Propose the decision at `ctx.pos`.
    fn find(&mut self, ctx: &SearchContext<'_>) -> Decision;
}

/// Build the finder for a strategy.
pub fn create(strategy: MatchStrategy, chain_depth: usize, nice_len: usize) -> Box<dyn MatchFinder> {
    match strategy {
        MatchStrategy::Literal => Box::new(LiteralFinder),
        MatchStrategy::Greedy => Box::new(GreedyFinder::new(chain_depth, nice_len)),
        MatchStrategy::Lazy => Box::new(LazyFinder::new(chain_depth, nice_len)),
    }
}

/// Calculate hash for 3 bytes (FNV-1a).
#[inline]
fn hash3(b0: u8, b1: u8, b2: u8) -> usize {
    let mut h = 2166136261u32;
    h ^= b0 as u32;
    h = h.wrapping_mul(16777619);
    h ^= b1 as u32;
    h = h.wrapping_mul(16777619);
    h ^= b2 as u32;
    h = h.wrapping_mul(16777619);
    (h as usize) & (HASH_SIZE - 1)
}

/// Hash chains over 3-byte prefixes.
#[derive(Debug, Clone)]
pub struct HashChain {
    /// Most recent position per hash.
    head: Vec<u32>,
    /// Previous position with the same hash, indexed by position.
    chain: Vec<u32>,
    /// Positions below this are indexed.
    indexed: usize,
    /// Maximum chain links followed per search.
    depth: usize,
    /// Stop searching once a match this long is found.
    nice_len: usize,
}

impl HashChain {
    /// Create empty hash chains.
    pub fn new(depth: usize, nice_len: usize) -> Self {
        Self {
            head: vec![NIL; HASH_SIZE],
            chain: Vec::new(),
            indexed: 0,
            depth,
            nice_len: nice_len.clamp(MATCH_LEN_MIN, MATCH_LEN_MAX),
        }
    }

    /// Forget every indexed position.
    pub fn reset(&mut self) {
        self.head.fill(NIL);
        self.chain.clear();
        self.indexed = 0;
    }

    /// Index every position before `end`.
    pub fn advance(&mut self, data: &[u8], end: usize) {
        let end = end.min(data.len());
        if self.chain.len() < end {
            self.chain.resize(end, NIL);
        }
        while self.indexed < end {
            let pos = self.indexed;
            if pos + 3 <= data.len() {
                let hash = hash3(data[pos], data[pos + 1], data[pos + 2]);
                self.chain[pos] = self.head[hash];
                self.head[hash] = pos as u32;
            }
            self.indexed += 1;
        }
    }

    /// Longest match at `ctx.pos` as `(distance, len)`.
    ///
    /// Positions up to `ctx.pos` must already be indexed, `ctx.pos` itself
    /// must not be.
    pub fn longest_match(&self, ctx: &SearchContext<'_>) -> Option<(u32, usize)> {
        let data = ctx.data;
        let pos = ctx.pos;
        let max_len = ctx.max_len();
        if max_len < 3 || self.depth == 0 {
            return None;
        }

        let hash = hash3(data[pos], data[pos + 1], data[pos + 2]);
        let mut candidate = self.head[hash];
        let mut best_len = 0usize;
        let mut best_dist = 0u32;
        let mut links = 0;

        while candidate != NIL && links < self.depth {
            let match_pos = candidate as usize;
            if match_pos >= pos {
                break;
            }
            let distance = (pos - match_pos - 1) as u32;
            if !ctx.is_distance_valid(distance) {
                break;
            }

            if data[match_pos + best_len.min(max_len - 1)] == data[pos + best_len.min(max_len - 1)]
            {
                let len = ctx.match_len(distance, max_len);
                if len > best_len {
                    best_len = len;
                    best_dist = distance;
                    if len >= self.nice_len || len >= max_len {
                        break;
                    }
                }
            }

            let next = self.chain[match_pos];
            if next != NIL && next as usize >= match_pos {
                break;
            }
            candidate = next;
            links += 1;
        }

        if best_len < 3 {
            return None;
        }
        Some((best_dist, best_len))
    }
}

/// Longest usable repeat match as `(index, len)`.
fn best_rep(ctx: &SearchContext<'_>) -> Option<(usize, usize)> {
    let max_len = ctx.max_len();
    let mut best: Option<(usize, usize)> = None;

    for (index, &distance) in ctx.reps.iter().enumerate() {
        if !ctx.is_distance_valid(distance) {
            continue;
        }
        let len = ctx.match_len(distance, max_len);
        if len >= MATCH_LEN_MIN && best.is_none_or(|(_, l)| len > l) {
            best = Some((index, len));
        }
    }
    best
}

/// Greedy choice between the best repeat and the best fresh match.
fn greedy_decision(chain: &HashChain, ctx: &SearchContext<'_>) -> Decision {
    let rep = best_rep(ctx);
    let normal = chain.longest_match(ctx);

    match (rep, normal) {
        (Some((index, rep_len)), Some((_, len)))
            if rep_len + 1 >= len || (index == 0 && rep_len + 2 >= len) =>
        {
            Decision::Rep {
                index,
                len: rep_len,
            }
        }
        (_, Some((distance, len))) => Decision::Match { distance, len },
        (Some((index, len)), None) => Decision::Rep { index, len },
        (None, None) => {
            let rep0 = ctx.reps[0];
            if ctx.is_distance_valid(rep0) && ctx.match_len(rep0, 1) == 1 {
                Decision::ShortRep
            } else {
                Decision::Literal
            }
        }
    }
}

/// Hash-chain finder taking the best match at each position.
#[derive(Debug, Clone)]
pub struct GreedyFinder {
    chain: HashChain,
}

impl GreedyFinder {
    /// Create a greedy finder.
    pub fn new(depth: usize, nice_len: usize) -> Self {
        Self {
            chain: HashChain::new(depth, nice_len),
        }
    }
}

impl MatchFinder for GreedyFinder {
    fn reset(&mut self) {
        self.chain.reset();
    }

    fn advance(&mut self, data: &[u8], end: usize) {
        self.chain.advance(data, end);
    }

    fn find(&mut self, ctx: &SearchContext<'_>) -> Decision {
        greedy_decision(&self.chain, ctx)
    }
}

/// Hash-chain finder that defers a match by one byte when the next position
/// holds a clearly longer one.
#[derive(Debug, Clone)]
pub struct LazyFinder {
    chain: HashChain,
}

impl LazyFinder {
    /// Create a lazy finder.
    pub fn new(depth: usize, nice_len: usize) -> Self {
        Self {
            chain: HashChain::new(depth, nice_len),
        }
    }
}

impl MatchFinder for LazyFinder {
    fn reset(&mut self) {
        self.chain.reset();
    }

    fn advance(&mut self, data: &[u8], end: usize) {
        self.chain.advance(data, end);
    }

    fn find(&mut self, ctx: &SearchContext<'_>) -> Decision {
        let decision = greedy_decision(&self.chain, ctx);

        let Decision::Match { len, .. } = decision else {
            return decision;
        };
        if len >= self.chain.nice_len || ctx.pos + 1 >= ctx.data.len() {
            return decision;
        }

        // Peek one byte ahead; indexing `pos` here is what the encoder would
        // do next anyway.
        self.chain.advance(ctx.data, ctx.pos + 1);
        let next = SearchContext {
            pos: ctx.pos + 1,
            ..*ctx
        };
        match self.chain.longest_match(&next) {
            Some((_, next_len)) if next_len > len + 1 => Decision::Literal,
            _ => decision,
        }
    }
}

/// Finder that only ever proposes literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralFinder;

impl MatchFinder for LiteralFinder {
    fn reset(&mut self) {}

    fn advance(&mut self, _data: &[u8], _end: usize) {}

    fn find(&mut self, _ctx: &SearchContext<'_>) -> Decision {
        Decision::Literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(data: &[u8], pos: usize) -> SearchContext<'_> {
        SearchContext {
            data,
            pos,
            reps: [0; 4],
            dictionary_size_check: 1 << 16,
        }
    }

    #[test]
    fn test_hash3_distribution() {
        assert_ne!(hash3(b'a', b'b', b'c'), hash3(b'a', b'b', b'd'));
        assert!(hash3(0xFF, 0xFF, 0xFF) < HASH_SIZE);
    }

    #[test]
    fn test_longest_match() {
        let data = b"abcdefabcdefabcdXYZ";
        let mut chain = HashChain::new(16, 273);
        chain.advance(data, 12);

        let (distance, len) = chain.longest_match(&ctx(data, 12)).unwrap();
        assert_eq!(distance, 5);
        assert_eq!(len, 4);
    }

    #[test]
    fn test_dictionary_limit() {
        let data = b"abcdefabcdef";
        let mut chain = HashChain::new(16, 273);
        chain.advance(data, 6);

        let mut c = ctx(data, 6);
        c.dictionary_size_check = 5;
        assert!(chain.longest_match(&c).is_none());

        c.dictionary_size_check = 6;
        assert_eq!(chain.longest_match(&c), Some((5, 6)));
    }

    #[test]
    fn test_greedy_prefers_rep() {
        let data = b"abcdabcdabcd";
        let mut finder = GreedyFinder::new(16, 273);
        finder.advance(data, 8);

        let mut c = ctx(data, 8);
        c.reps = [3, 0, 0, 0];
        assert_eq!(finder.find(&c), Decision::Rep { index: 0, len: 4 });
    }

    #[test]
    fn test_short_rep() {
        let data = b"xqzxw";
        let mut finder = GreedyFinder::new(16, 273);
        finder.advance(data, 3);

        let mut c = ctx(data, 3);
        c.reps = [2, 0, 0, 0];
        assert_eq!(finder.find(&c), Decision::ShortRep);
    }

    #[test]
    fn test_first_position_is_literal() {
        let data = b"aaaa";
        let mut finder = GreedyFinder::new(16, 273);
        assert_eq!(finder.find(&ctx(data, 0)), Decision::Literal);
    }

    #[test]
    fn test_lazy_defers() {
        // At 10 the best match is "bcd" (3), at 11 "cdefgh" (6).
        let data = b"bcdxcdefghbcdefgh";
        let mut greedy = GreedyFinder::new(64, 273);
        let mut lazy = LazyFinder::new(64, 273);
        greedy.advance(data, 10);
        lazy.advance(data, 10);

        let c = ctx(data, 10);
        assert!(matches!(greedy.find(&c), Decision::Match { len: 3, .. }));
        assert_eq!(lazy.find(&c), Decision::Literal);
    }

    #[test]
    fn test_literal_finder() {
        let data = b"aaaaaaaa";
        let mut finder = LiteralFinder;
        finder.advance(data, 4);
        assert_eq!(finder.find(&ctx(data, 4)), Decision::Literal);
    }

    #[test]
    fn test_decision_consumed() {
        assert_eq!(Decision::Literal.consumed(), 1);
        assert_eq!(Decision::ShortRep.consumed(), 1);
        assert_eq!(Decision::Rep { index: 2, len: 7 }.consumed(), 7);
        assert_eq!(Decision::Match { distance: 9, len: 12 }.consumed(), 12);
    }
}
