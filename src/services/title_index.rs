use std::collections::HashMap;

use parking_lot::RwLock;

use crate::models::{ListId, ToDoList};

/// Splits a list title into normalized index words
///
/// Any non-alphanumeric character separates words; words are lowercased.
pub fn tokenize_title(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn normalize_word(word: &str) -> Option<String> {
    let word = word.trim().to_lowercase();
    (!word.is_empty()).then_some(word)
}

/// Inverted index from title words to the lists carrying them
///
/// Buckets only ever grow: indexing the same list twice stores it twice, and
/// retitled or deleted lists keep their old words until [`TitleIndex::rebuild`]
/// replaces the whole index. A match therefore may name a list that no
/// longer exists; callers resolve ids against the list store.
pub struct TitleIndex {
    words: RwLock<HashMap<String, Vec<ListId>>>,
    match_limit: usize,
}

impl TitleIndex {
    pub fn new(match_limit: usize) -> Self {
        Self {
            words: RwLock::new(HashMap::new()),
            match_limit,
        }
    }

    /// Appends `list_id` to the bucket of every given word
    pub fn index_title<S: AsRef<str>>(&self, list_id: ListId, words: &[S]) {
        let mut index = self.words.write();
        for word in words.iter().filter_map(|w| normalize_word(w.as_ref())) {
            index.entry(word).or_default().push(list_id);
        }
        tracing::debug!(list_id, distinct_words = index.len(), "Indexed list title");
    }

    /// Tokenizes and indexes a list's current title
    pub fn index_list(&self, list: &ToDoList) {
        self.index_title(list.id, &tokenize_title(&list.title));
    }

    /// Ranks lists by how many query words hit them
    ///
    /// Every occurrence of a list in a matching word's bucket counts once.
    /// Buckets are read newest entry first, and equal counts keep that
    /// encounter order, so recently indexed lists win ties.
    pub fn match_titles<S: AsRef<str>>(&self, words: &[S]) -> Vec<ListId> {
        let index = self.words.read();

        let mut candidates: Vec<(ListId, usize)> = Vec::new();
        let mut positions: HashMap<ListId, usize> = HashMap::new();

        for word in words.iter().filter_map(|w| normalize_word(w.as_ref())) {
            let Some(bucket) = index.get(&word) else {
                continue;
            };
            for &list_id in bucket.iter().rev() {
                match positions.get(&list_id) {
                    Some(&position) => candidates[position].1 += 1,
                    None => {
                        positions.insert(list_id, candidates.len());
                        candidates.push((list_id, 1));
                    }
                }
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates
            .into_iter()
            .take(self.match_limit)
            .map(|(list_id, _)| list_id)
            .collect()
    }

    /// Tokenizes a free-text query and matches it
    pub fn search(&self, query: &str) -> Vec<ListId> {
        self.match_titles(&tokenize_title(query))
    }

    /// Replaces the whole index with the given lists, indexed in order
    ///
    /// Pass lists oldest first so the newest end up on top of each bucket.
    pub fn rebuild(&self, lists: &[ToDoList]) {
        let mut rebuilt: HashMap<String, Vec<ListId>> = HashMap::new();
        for list in lists {
            for word in tokenize_title(&list.title) {
                rebuilt.entry(word).or_default().push(list.id);
            }
        }

        let words = rebuilt.len();
        *self.words.write() = rebuilt;

        tracing::info!(lists = lists.len(), words, "Title index rebuilt");
    }

    /// Number of distinct indexed words
    pub fn word_count(&self) -> usize {
        self.words.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_tokenize_title_splits_on_punctuation_and_lowercases() {
        assert_eq!(
            tokenize_title("Buy milk, eggs & BREAD!"),
            vec!["buy", "milk", "eggs", "bread"]
        );
        assert!(tokenize_title("  -- ").is_empty());
    }

    #[test]
    fn test_more_overlapping_words_rank_higher() {
        let index = TitleIndex::new(15);
        index.index_title(1, &["buy", "milk"]);
        index.index_title(2, &["buy", "bread"]);

        assert_eq!(index.match_titles(&["buy", "milk"]), vec![1, 2]);
    }

    #[test]
    fn test_ties_favor_most_recently_indexed() {
        let index = TitleIndex::new(15);
        index.index_title(1, &["gym"]);
        index.index_title(2, &["gym"]);
        index.index_title(3, &["gym"]);

        assert_eq!(index.match_titles(&["gym"]), vec![3, 2, 1]);
    }

    #[test]
    fn test_reindexing_amplifies_score() {
        let index = TitleIndex::new(15);
        index.index_title(1, &["run"]);
        index.index_title(2, &["run", "daily"]);
        index.index_title(1, &["run"]);

        // list 1 was indexed twice under "run"
        assert_eq!(index.match_titles(&["run"]), vec![1, 2]);
        assert_eq!(index.match_titles(&["run", "daily"]), vec![1, 2]);
    }

    #[test]
    fn test_result_capped_at_match_limit() {
        let index = TitleIndex::new(15);
        for list_id in 1..=20 {
            index.index_title(list_id, &["read"]);
        }
        for list_id in [4, 9] {
            index.index_title(list_id, &["books"]);
        }

        let matches = index.match_titles(&["read", "books"]);

        assert_eq!(matches.len(), 15);
        assert_eq!(&matches[..2], &[9, 4]);
        assert_eq!(matches[2], 20);
    }

    #[test]
    fn test_unknown_and_empty_queries_yield_nothing() {
        let index = TitleIndex::new(15);
        index.index_title(1, &["walk"]);

        assert!(index.match_titles(&["swim"]).is_empty());
        assert!(index.match_titles::<&str>(&[]).is_empty());
        assert!(index.search("").is_empty());
    }

    #[test]
    fn test_query_words_are_normalized() {
        let index = TitleIndex::new(15);
        index.index_list(&ToDoList::new(7, 1, "Learn Rust", Utc::now()));

        assert_eq!(index.match_titles(&[" RUST "]), vec![7]);
        assert_eq!(index.search("learn: rust"), vec![7]);
    }

    #[test]
    fn test_rebuild_drops_stale_words() {
        let index = TitleIndex::new(15);
        index.index_title(1, &["old", "title"]);

        index.rebuild(&[ToDoList::new(1, 1, "New title", Utc::now())]);

        assert!(index.match_titles(&["old"]).is_empty());
        assert_eq!(index.match_titles(&["new", "title"]), vec![1]);
        assert_eq!(index.word_count(), 2);
    }
}
