use std::collections::BTreeMap;

pub const FIRST_CHAPTER: u32 = 1;

/// Contiguous chapter range `1..=last` with optional display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    last: u32,
    names: BTreeMap<u32, String>,
}

impl Catalog {
    pub fn new(last: u32) -> Self {
        Self {
            last: last.max(FIRST_CHAPTER),
            names: BTreeMap::new(),
        }
    }

    /// Names for chapters outside the range are dropped.
    pub fn with_names(mut self, names: impl IntoIterator<Item = (u32, String)>) -> Self {
        for (number, name) in names {
            if self.contains(number) {
                self.names.insert(number, name);
            }
        }
        self
    }

    pub fn first(&self) -> u32 {
        FIRST_CHAPTER
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn len(&self) -> usize {
        self.last as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, number: u32) -> bool {
        (FIRST_CHAPTER..=self.last).contains(&number)
    }

    pub fn clamp(&self, number: u32) -> u32 {
        number.clamp(FIRST_CHAPTER, self.last)
    }

    pub fn display_name(&self, number: u32) -> String {
        self.names
            .get(&number)
            .cloned()
            .unwrap_or_else(|| format!("Chapter {number}"))
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, String)> + '_ {
        (FIRST_CHAPTER..=self.last).map(|n| (n, self.display_name(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let catalog = Catalog::new(12);
        assert!(!catalog.contains(0));
        assert!(catalog.contains(1));
        assert!(catalog.contains(12));
        assert!(!catalog.contains(13));
        assert_eq!(catalog.clamp(40), 12);
        assert_eq!(catalog.clamp(0), 1);
    }

    #[test]
    fn zero_sized_catalog_still_has_first_chapter() {
        let catalog = Catalog::new(0);
        assert_eq!(catalog.last(), 1);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn display_names_fall_back_to_number() {
        let catalog =
            Catalog::new(3).with_names([(2, "The Gate".to_string()), (9, "x".to_string())]);
        let entries: Vec<_> = catalog.entries().collect();
        assert_eq!(
            entries,
            vec![
                (1, "Chapter 1".to_string()),
                (2, "The Gate".to_string()),
                (3, "Chapter 3".to_string()),
            ]
        );
    }
}
