// Insertion-ordered multivalued map

/// A map from names to lists of values that keeps keys in insertion order.
///
/// Templates rarely bind more than a handful of names, so lookups are linear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultivaluedMap<V> {
    entries: Vec<(String, Vec<V>)>,
}

impl<V> MultivaluedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a value to the list of `key`
    pub fn add(&mut self, key: &str, value: V) {
        match self.position(key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key.to_string(), vec![value])),
        }
    }

    /// Replace the list of `key` with a single value
    pub fn put_single(&mut self, key: &str, value: V) {
        self.put(key, vec![value]);
    }

    /// Replace the list of `key`
    pub fn put(&mut self, key: &str, values: Vec<V>) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((key.to_string(), values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[V]> {
        self.position(key).map(|i| self.entries[i].1.as_slice())
    }

    pub fn get_first(&self, key: &str) -> Option<&V> {
        self.get(key).and_then(|values| values.first())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<V>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[V])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Apply `f` to every value, keeping keys and order
    pub fn map_values<U>(&self, mut f: impl FnMut(&V) -> U) -> MultivaluedMap<U> {
        MultivaluedMap {
            entries: self
                .entries
                .iter()
                .map(|(key, values)| (key.clone(), values.iter().map(&mut f).collect()))
                .collect(),
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<V> Default for MultivaluedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for MultivaluedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.add(key.as_ref(), value);
        }
        map
    }
}

impl<K: AsRef<str>, V> Extend<(K, V)> for MultivaluedMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key.as_ref(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut map = MultivaluedMap::new();
        map.add("b", 1);
        map.add("a", 2);
        map.add("b", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&[1, 3][..]));
        assert_eq!(map.get_first("a"), Some(&2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_put_single_replaces() {
        let mut map: MultivaluedMap<&str> = [("x", "1"), ("x", "2")].into_iter().collect();
        map.put_single("x", "3");
        assert_eq!(map.get("x"), Some(&["3"][..]));
    }

    #[test]
    fn test_missing_key() {
        let map: MultivaluedMap<String> = MultivaluedMap::new();
        assert!(map.get("nope").is_none());
        assert!(map.get_first("nope").is_none());
        assert!(!map.contains_key("nope"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_map_values_and_remove() {
        let mut map: MultivaluedMap<i32> = [("a", 1), ("b", 2)].into_iter().collect();
        let doubled = map.map_values(|v| v * 2);
        assert_eq!(doubled.get("b"), Some(&[4][..]));
        assert_eq!(map.remove("a"), Some(vec![1]));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b"]);
    }
}
