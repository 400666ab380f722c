//! Block sequences: the group of coloured blocks placed as one stroke, and their generator.

use crate::theme::Rgba;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Longest sequence the generator produces.
pub const MAX_SEQUENCE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub color: Rgba,
    /// Drawn larger so the player knows which end the stroke starts from.
    pub is_first: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    blocks: Vec<Block>,
}

impl Sequence {
    /// Build from colours in placement order; the first block is marked.
    pub fn from_colors(colors: impl IntoIterator<Item = Rgba>) -> Self {
        let blocks = colors
            .into_iter()
            .enumerate()
            .map(|(i, color)| Block {
                color,
                is_first: i == 0,
            })
            .collect();
        Self { blocks }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn color_at(&self, i: usize) -> Option<Rgba> {
        self.blocks.get(i).map(|b| b.color)
    }

    pub fn colors(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.blocks.iter().map(|b| b.color)
    }
}

/// Random lengths and colours for new sequences.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    rng: StdRng,
    palette: Vec<Rgba>,
    /// Chance of drawing from {1, 4} instead of {2, 3}.
    one_or_four_chance: f64,
}

impl SequenceGenerator {
    /// `palette` must be non-empty; `GameConfig::validate` enforces it.
    pub fn new(palette: Vec<Rgba>, one_or_four_chance: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            palette,
            one_or_four_chance: one_or_four_chance.clamp(0.0, 1.0),
        }
    }

    /// 1 or 4 with probability `one_or_four_chance`, else 2 or 3; each pair split evenly.
    pub fn generate_length(&mut self) -> usize {
        let rare = self.rng.random::<f64>() <= self.one_or_four_chance;
        let low = self.rng.random::<f64>() < 0.5;
        match (rare, low) {
            (true, true) => 1,
            (true, false) => 4,
            (false, true) => 2,
            (false, false) => 3,
        }
    }

    pub fn generate_color(&mut self) -> Rgba {
        let i = self.rng.random_range(0..self.palette.len());
        self.palette[i]
    }

    pub fn generate_sequence(&mut self, len: usize) -> Sequence {
        Sequence::from_colors((0..len).map(|_| self.generate_color()).collect::<Vec<_>>())
    }

    /// A sequence of random length.
    pub fn next_sequence(&mut self) -> Sequence {
        let len = self.generate_length();
        self.generate_sequence(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<Rgba> {
        vec![
            Rgba::opaque(255, 0, 0),
            Rgba::opaque(0, 255, 0),
            Rgba::opaque(0, 0, 255),
        ]
    }

    #[test]
    fn first_block_is_marked() {
        let seq = Sequence::from_colors(palette());
        assert_eq!(seq.len(), 3);
        assert!(seq.blocks()[0].is_first);
        assert!(seq.blocks()[1..].iter().all(|b| !b.is_first));
        assert_eq!(seq.color_at(2), Some(Rgba::opaque(0, 0, 255)));
        assert_eq!(seq.color_at(3), None);
    }

    #[test]
    fn lengths_stay_in_range() {
        let mut generator = SequenceGenerator::new(palette(), 0.33, Some(7));
        let mut seen = [false; MAX_SEQUENCE_LEN + 1];
        for _ in 0..1000 {
            let len = generator.generate_length();
            assert!((1..=MAX_SEQUENCE_LEN).contains(&len));
            seen[len] = true;
        }
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn zero_chance_only_gives_two_or_three() {
        let mut generator = SequenceGenerator::new(palette(), 0.0, Some(1));
        for _ in 0..500 {
            assert!(matches!(generator.generate_length(), 2 | 3));
        }
    }

    #[test]
    fn full_chance_only_gives_one_or_four() {
        let mut generator = SequenceGenerator::new(palette(), 1.0, Some(1));
        for _ in 0..500 {
            assert!(matches!(generator.generate_length(), 1 | 4));
        }
    }

    #[test]
    fn medium_lengths_dominate_by_default() {
        let mut generator = SequenceGenerator::new(palette(), 0.33, Some(99));
        let medium = (0..4000)
            .filter(|_| matches!(generator.generate_length(), 2 | 3))
            .count();
        // expected ~2680
        assert!((2400..3000).contains(&medium), "{medium}");
    }

    #[test]
    fn colours_come_from_palette() {
        let mut generator = SequenceGenerator::new(palette(), 0.33, Some(3));
        let seq = generator.generate_sequence(4);
        assert_eq!(seq.len(), 4);
        assert!(seq.colors().all(|c| palette().contains(&c)));
        assert!(seq.blocks()[0].is_first);
    }

    #[test]
    fn same_seed_same_sequences() {
        let mut a = SequenceGenerator::new(palette(), 0.33, Some(42));
        let mut b = SequenceGenerator::new(palette(), 0.33, Some(42));
        for _ in 0..20 {
            assert_eq!(a.next_sequence(), b.next_sequence());
        }
    }
}
