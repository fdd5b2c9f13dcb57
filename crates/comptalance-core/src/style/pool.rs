//! Per-sheet style interning

use std::hash::{Hash, Hasher};

use ahash::{AHashMap, AHasher};

use super::Style;

/// Deduplicated styles of one worksheet.
///
/// Index 0 always holds the default style, so a cell with
/// `style_index == 0` is unformatted.
#[derive(Debug, Clone)]
pub struct StylePool {
    styles: Vec<Style>,
    by_hash: AHashMap<u64, Vec<u32>>,
}

fn style_hash(style: &Style) -> u64 {
    let mut hasher = AHasher::default();
    style.hash(&mut hasher);
    hasher.finish()
}

impl StylePool {
    pub fn new() -> Self {
        let mut pool = Self {
            styles: Vec::new(),
            by_hash: AHashMap::new(),
        };
        pool.push(Style::default());
        pool
    }

    fn push(&mut self, style: Style) -> u32 {
        let idx = self.styles.len() as u32;
        self.by_hash.entry(style_hash(&style)).or_default().push(idx);
        self.styles.push(style);
        idx
    }

    /// Index of an equal style, inserting it when absent
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        let existing = self.by_hash.get(&style_hash(&style)).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&idx| self.styles[idx as usize] == style)
        });
        match existing {
            Some(idx) => idx,
            None => self.push(style),
        }
    }

    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Only the default style is present
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_default_at_zero() {
        let mut pool = StylePool::new();
        assert_eq!(pool.len(), 1);
        assert!(pool.is_empty());
        assert_eq!(pool.get_or_insert(Style::default()), 0);
    }

    #[test]
    fn test_deduplication() {
        let mut pool = StylePool::new();

        let bold = pool.get_or_insert(Style::new().bold(true));
        let again = pool.get_or_insert(Style::new().bold(true));
        let filled = pool.get_or_insert(Style::new().fill_color(Color::RED));

        assert_eq!(bold, again);
        assert_ne!(bold, filled);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(filled), Some(&Style::new().fill_color(Color::RED)));
    }
}
