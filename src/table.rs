use std::cmp::Ordering;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::columns::ColumnDef;
use crate::domain::TVError;
use crate::post::{Post, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn glyph(&self) -> &'static str {
        match self {
            SortDirection::Ascending => " ↑",
            SortDirection::Descending => " ↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub direction: SortDirection,
}

/// The rows visible on the current page, as indices into the record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub rows: Vec<usize>,
    pub page_index: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

impl PageView {
    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count
    }
}

pub fn page_count(total_rows: usize, page_size: usize) -> usize {
    total_rows.div_ceil(page_size.max(1)).max(1)
}

/// Row mapping of the full collection after applying `sorting`.
///
/// Entries of `sorting` are compared in order; keys that name no sortable
/// column are skipped. The sort is stable, so equal keys keep fetch order.
pub fn sorted_rows(records: &[Post], columns: &[ColumnDef], sorting: &[SortSpec]) -> Vec<usize> {
    let mut rows: Vec<usize> = (0..records.len()).collect();

    let specs: Vec<(&ColumnDef, SortDirection)> = sorting
        .iter()
        .filter_map(|s| {
            columns
                .iter()
                .find(|c| c.key == s.key && c.is_sortable())
                .map(|c| (c, s.direction))
        })
        .collect();
    if specs.is_empty() {
        return rows;
    }

    let keys: Vec<Vec<Option<Value>>> = records
        .par_iter()
        .map(|p| specs.iter().map(|(c, _)| c.value(p)).collect())
        .collect();

    rows.par_sort_by(|&a, &b| {
        for (i, (_, direction)) in specs.iter().enumerate() {
            let ord = keys[a][i].cmp(&keys[b][i]);
            let ord = match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    rows
}

fn slice_page(rows: &[usize], page_index: usize, page_size: usize) -> PageView {
    let page_size = page_size.max(1);
    let count = page_count(rows.len(), page_size);
    let page_index = page_index.min(count - 1);
    let rbegin = std::cmp::min(page_index * page_size, rows.len());
    let rend = std::cmp::min(rbegin + page_size, rows.len());
    PageView {
        rows: rows[rbegin..rend].to_vec(),
        page_index,
        page_count: count,
        total_rows: rows.len(),
    }
}

/// Sorts the full collection, then slices out the requested page.
pub fn page_view(
    records: &[Post],
    columns: &[ColumnDef],
    sorting: &[SortSpec],
    page_index: usize,
    page_size: usize,
) -> PageView {
    let rows = sorted_rows(records, columns, sorting);
    slice_page(&rows, page_index, page_size)
}

/// Pagination and single column sorting over a record collection.
pub struct TableEngine {
    columns: Vec<ColumnDef>,
    records: Arc<Vec<Post>>,
    rows: Arc<Vec<usize>>, // Sorted mapping of table row to record index
    sorting: Vec<SortSpec>,
    page_index: usize,
    page_size: usize,
}

impl TableEngine {
    pub fn new(columns: Vec<ColumnDef>, page_size: usize) -> Result<Self, TVError> {
        if page_size == 0 {
            return Err(TVError::InvalidPageSize(page_size));
        }
        Ok(Self {
            columns,
            records: Arc::new(Vec::new()),
            rows: Arc::new(Vec::new()),
            sorting: Vec::new(),
            page_index: 0,
            page_size,
        })
    }

    pub fn set_records(&mut self, records: Arc<Vec<Post>>) {
        debug!("Replacing table records with {} posts", records.len());
        self.records = records;
        self.resort();
        self.page_index = self.page_index.min(self.page_count() - 1);
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn records(&self) -> &Arc<Vec<Post>> {
        &self.records
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        page_count(self.rows.len(), self.page_size)
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn page(&self) -> PageView {
        slice_page(&self.rows, self.page_index, self.page_size)
    }

    /// Records of the current page in display order.
    pub fn page_rows(&self) -> Vec<&Post> {
        self.page()
            .rows
            .iter()
            .map(|&ridx| &self.records[ridx])
            .collect()
    }

    pub fn sorting(&self) -> &[SortSpec] {
        &self.sorting
    }

    pub fn sort_state(&self, key: &str) -> Option<SortDirection> {
        self.sorting
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.direction)
    }

    pub fn set_page_index(&mut self, index: usize) {
        self.page_index = index.min(self.page_count() - 1);
        trace!("Page index set to {}", self.page_index);
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.page_index -= 1;
        }
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.page_index += 1;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TVError> {
        if page_size == 0 {
            return Err(TVError::InvalidPageSize(page_size));
        }
        self.page_size = page_size;
        self.page_index = 0;
        debug!(
            "Page size set to {page_size}, {} pages",
            self.page_count()
        );
        Ok(())
    }

    /// Cycles the sort of `key` through unsorted, ascending and descending.
    /// Sorting another column replaces the active sort. Returns false if the
    /// key names no sortable column.
    pub fn toggle_sort(&mut self, key: &str) -> bool {
        let Some(column) = self.columns.iter().find(|c| c.key == key && c.is_sortable()) else {
            trace!("Ignoring sort toggle on {key}");
            return false;
        };
        let key = column.key;

        let next = match self.sort_state(key) {
            None => Some(SortDirection::Ascending),
            Some(SortDirection::Ascending) => Some(SortDirection::Descending),
            Some(SortDirection::Descending) => None,
        };
        self.sorting = next
            .map(|direction| vec![SortSpec { key, direction }])
            .unwrap_or_default();
        debug!("Sorting is now {:?}", self.sorting);

        self.resort();
        self.page_index = 0;
        true
    }

    fn resort(&mut self) {
        self.rows = Arc::new(sorted_rows(&self.records, &self.columns, &self.sorting));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::post_columns;
    use crate::post::sample_posts;

    fn engine(n: usize, page_size: usize) -> TableEngine {
        let mut engine = TableEngine::new(post_columns(), page_size).unwrap();
        engine.set_records(Arc::new(sample_posts(n)));
        engine
    }

    fn page_ids(engine: &TableEngine) -> Vec<i64> {
        engine.page_rows().iter().map(|p| p.id).collect()
    }

    #[test]
    fn page_count_is_ceil_and_at_least_one() {
        assert_eq!(page_count(0, 30), 1);
        assert_eq!(page_count(1, 30), 1);
        assert_eq!(page_count(30, 30), 1);
        assert_eq!(page_count(31, 30), 2);
        assert_eq!(page_count(95, 30), 4);
        assert_eq!(page_count(100, 10), 10);
    }

    #[test]
    fn ninety_five_records_in_pages_of_thirty() {
        let mut engine = engine(95, 30);
        assert_eq!(engine.page_count(), 4);
        assert_eq!(engine.total_rows(), 95);

        engine.set_page_index(2);
        assert_eq!(page_ids(&engine), (61..=90).collect::<Vec<_>>());

        engine.set_page_index(3);
        assert_eq!(page_ids(&engine), vec![91, 92, 93, 94, 95]);
    }

    #[test]
    fn navigation_predicates_follow_page_index() {
        let mut engine = engine(95, 30);
        for index in 0..engine.page_count() {
            engine.set_page_index(index);
            assert_eq!(engine.can_previous_page(), index != 0);
            assert_eq!(engine.can_next_page(), index != engine.page_count() - 1);
        }
    }

    #[test]
    fn previous_and_next_stop_at_bounds() {
        let mut engine = engine(25, 10);
        engine.previous_page();
        assert_eq!(engine.page_index(), 0);

        engine.next_page();
        engine.next_page();
        engine.next_page();
        assert_eq!(engine.page_index(), 2);
        assert!(!engine.can_next_page());

        engine.previous_page();
        assert_eq!(engine.page_index(), 1);
    }

    #[test]
    fn set_page_index_clamps() {
        let mut engine = engine(25, 10);
        engine.set_page_index(99);
        assert_eq!(engine.page_index(), 2);
    }

    #[test]
    fn changing_page_size_resets_index() {
        let mut engine = engine(95, 10);
        engine.set_page_index(5);
        engine.set_page_size(50).unwrap();
        assert_eq!(engine.page_index(), 0);
        assert_eq!(engine.page_count(), 2);
        assert_eq!(page_ids(&engine).len(), 50);

        assert!(matches!(
            engine.set_page_size(0),
            Err(TVError::InvalidPageSize(0))
        ));
        assert_eq!(engine.page_size(), 50);
    }

    #[test]
    fn toggle_cycles_ascending_descending_unsorted() {
        let mut engine = engine(12, 100);
        let original = page_ids(&engine);

        assert!(engine.toggle_sort("id"));
        assert_eq!(engine.sort_state("id"), Some(SortDirection::Ascending));
        assert_eq!(page_ids(&engine), original);

        engine.toggle_sort("id");
        assert_eq!(engine.sort_state("id"), Some(SortDirection::Descending));
        assert_eq!(page_ids(&engine), (1..=12).rev().collect::<Vec<_>>());

        engine.toggle_sort("id");
        assert_eq!(engine.sort_state("id"), None);
        assert_eq!(page_ids(&engine), original);
    }

    #[test]
    fn title_sort_and_back_to_fetch_order() {
        let mut posts = sample_posts(3);
        posts[0].title = "banana".into();
        posts[1].title = "cherry".into();
        posts[2].title = "apple".into();
        let mut engine = TableEngine::new(post_columns(), 30).unwrap();
        engine.set_records(Arc::new(posts));

        engine.toggle_sort("title");
        assert_eq!(page_ids(&engine), vec![3, 1, 2]);
        engine.toggle_sort("title");
        assert_eq!(page_ids(&engine), vec![2, 1, 3]);
        engine.toggle_sort("title");
        assert_eq!(page_ids(&engine), vec![1, 2, 3]);
    }

    #[test]
    fn sorting_another_column_replaces_active_sort() {
        let mut engine = engine(20, 30);
        engine.toggle_sort("id");
        engine.toggle_sort("id");
        engine.toggle_sort("title");
        assert_eq!(engine.sort_state("id"), None);
        assert_eq!(engine.sort_state("title"), Some(SortDirection::Ascending));
        assert_eq!(engine.sorting().len(), 1);
    }

    #[test]
    fn sort_resets_page_index() {
        let mut engine = engine(95, 30);
        engine.set_page_index(3);
        engine.toggle_sort("userId");
        assert_eq!(engine.page_index(), 0);
    }

    #[test]
    fn action_columns_ignore_sort_toggles() {
        let mut engine = engine(20, 30);
        engine.set_page_index(0);
        assert!(!engine.toggle_sort("update"));
        assert!(!engine.toggle_sort("delete"));
        assert!(!engine.toggle_sort("nope"));
        assert!(engine.sorting().is_empty());
    }

    #[test]
    fn equal_keys_keep_fetch_order_deterministically() {
        // sample posts share user ids in blocks of ten
        let mut engine = engine(30, 100);
        engine.toggle_sort("userId");
        engine.toggle_sort("userId");
        let first = page_ids(&engine);
        assert_eq!(&first[..10], &(21..=30).collect::<Vec<_>>()[..]);

        let again = page_view(
            engine.records(),
            engine.columns(),
            engine.sorting(),
            0,
            100,
        );
        let again: Vec<i64> = again.rows.iter().map(|&r| engine.records()[r].id).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn empty_collection_has_single_page() {
        let engine = TableEngine::new(post_columns(), 30).unwrap();
        let page = engine.page();
        assert_eq!(page.page_count, 1);
        assert!(page.rows.is_empty());
        assert!(!page.can_previous_page());
        assert!(!page.can_next_page());
    }

    #[test]
    fn sorting_never_mutates_records() {
        let mut engine = engine(10, 30);
        let before: Vec<Post> = engine.records().to_vec();
        engine.toggle_sort("title");
        engine.toggle_sort("title");
        assert_eq!(engine.records().as_slice(), before.as_slice());
    }

    #[test]
    fn replacing_records_clamps_page_index() {
        let mut engine = engine(95, 10);
        engine.set_page_index(9);
        engine.set_records(Arc::new(sample_posts(15)));
        assert_eq!(engine.page_index(), 1);
    }

    #[test]
    fn pure_page_view_matches_engine() {
        let posts = sample_posts(45);
        let columns = post_columns();
        let sorting = [SortSpec {
            key: "id",
            direction: SortDirection::Descending,
        }];
        let view = page_view(&posts, &columns, &sorting, 1, 30);
        assert_eq!(view.page_count, 2);
        assert_eq!(view.total_rows, 45);
        assert_eq!(view.rows.len(), 15);
        assert_eq!(posts[view.rows[0]].id, 15);
        assert!(view.can_previous_page());
        assert!(!view.can_next_page());
    }
}
