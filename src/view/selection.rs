use crate::error::SelectionError;
use crate::search::model::{ResultSet, SearchResult};

/// Whether a successful `select` moved to a different result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Changed { from: usize, to: usize },
    Unchanged(usize),
}

/// The ranked results of the current search plus the one being displayed.
/// A selection always points at an existing result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSelection {
    results: ResultSet,
    selected: usize,
}

impl ResultSelection {
    /// Install a freshly returned result set with the top result selected.
    /// An empty set is an error; the caller shows the empty state instead.
    pub fn install(results: ResultSet) -> Result<Self, SelectionError> {
        if results.is_empty() {
            return Err(SelectionError::EmptyResultSet);
        }
        Ok(Self {
            results,
            selected: 0,
        })
    }

    pub fn select(&mut self, index: usize) -> Result<SelectionChange, SelectionError> {
        if index >= self.results.len() {
            return Err(SelectionError::IndexOutOfRange {
                index,
                len: self.results.len(),
            });
        }
        if index == self.selected {
            return Ok(SelectionChange::Unchanged(index));
        }
        let from = self.selected;
        self.selected = index;
        Ok(SelectionChange::Changed { from, to: index })
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// 1-based rank of the selected result.
    pub fn rank(&self) -> usize {
        self.selected + 1
    }

    pub fn selected(&self) -> &SearchResult {
        // `selected` is kept in range by `new` and `select`.
        &self.results.as_slice()[self.selected]
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str) -> SearchResult {
        SearchResult {
            video_id: id.into(),
            timestamp_seconds: 1.0,
            score: 0.5,
            query_keypoints: Vec::new(),
            matched_keypoints: Vec::new(),
            matched_frame: None,
        }
    }

    fn set(len: usize) -> ResultSet {
        ResultSet::new((0..len).map(|i| result(&format!("v{i}"))).collect())
    }

    #[test]
    fn installed_selection_starts_at_top_result() {
        for len in 1..5 {
            let selection = ResultSelection::install(set(len)).unwrap();
            assert_eq!(selection.selected_index(), 0);
            assert_eq!(selection.selected().video_id, "v0");
        }
    }

    #[test]
    fn empty_set_is_reported() {
        assert_eq!(
            ResultSelection::install(ResultSet::default()).unwrap_err(),
            SelectionError::EmptyResultSet
        );
    }

    #[test]
    fn select_in_range_updates_and_out_of_range_does_not() {
        let mut selection = ResultSelection::install(set(5)).unwrap();
        assert_eq!(
            selection.select(2),
            Ok(SelectionChange::Changed { from: 0, to: 2 })
        );
        assert_eq!(selection.selected().video_id, "v2");
        assert_eq!(selection.rank(), 3);

        assert_eq!(
            selection.select(5),
            Err(SelectionError::IndexOutOfRange { index: 5, len: 5 })
        );
        assert_eq!(selection.selected_index(), 2);
    }

    #[test]
    fn selecting_the_same_index_is_a_no_op() {
        let mut selection = ResultSelection::install(set(2)).unwrap();
        assert_eq!(selection.select(0), Ok(SelectionChange::Unchanged(0)));
        assert_eq!(selection.selected_index(), 0);
    }
}
