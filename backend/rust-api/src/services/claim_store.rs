/// Ordered claim slots. Index 0 is the independent claim, the rest are dependent claims.
///
/// Always holds at least one slot. Removing shifts later slots down by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimStore {
    claims: Vec<String>,
}

impl Default for ClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimStore {
    pub fn new() -> Self {
        Self {
            claims: vec![String::new()],
        }
    }

    /// Appends an empty slot and returns its index.
    pub fn add_claim(&mut self) -> usize {
        self.claims.push(String::new());
        self.claims.len() - 1
    }

    /// Out-of-range indices are ignored.
    pub fn update_claim(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.claims.get_mut(index) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    /// No-op when `index` is out of range or only one slot is left.
    pub fn remove_claim(&mut self, index: usize) -> bool {
        if self.claims.len() <= 1 || index >= self.claims.len() {
            return false;
        }
        self.claims.remove(index);
        true
    }

    pub fn claims(&self) -> &[String] {
        &self.claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Slots with any non-whitespace text.
    pub fn filled_count(&self) -> usize {
        self.claims.iter().filter(|c| !c.trim().is_empty()).count()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.claims.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_empty_slot() {
        let store = ClaimStore::new();
        assert_eq!(store.claims(), &[String::new()]);
        assert_eq!(store.filled_count(), 0);
    }

    #[test]
    fn removing_the_last_slot_is_a_no_op() {
        let mut store = ClaimStore::new();
        assert!(!store.remove_claim(0));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[test]
    fn update_out_of_range_is_ignored() {
        let mut store = ClaimStore::new();
        assert!(!store.update_claim(3, "배터리 장치"));
        assert_eq!(store.claims(), &[String::new()]);
    }

    #[test]
    fn removal_shifts_later_slots_down() {
        let mut store = ClaimStore::new();
        store.add_claim();
        store.add_claim();
        store.update_claim(0, "first");
        store.update_claim(1, "second");
        store.update_claim(2, "third");

        assert!(store.remove_claim(1));
        assert_eq!(store.claims(), &["first".to_string(), "third".to_string()]);
        assert!(!store.remove_claim(5));
    }

    #[test]
    fn never_drops_below_one_slot() {
        let mut store = ClaimStore::new();
        store.add_claim();
        assert!(store.remove_claim(0));
        assert!(!store.remove_claim(0));
        assert_eq!(store.len(), 1);
    }
}
