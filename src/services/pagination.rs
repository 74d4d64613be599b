use serde::Serialize;

/// Resolved position of a page inside a collection of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
}

impl PageWindow {
    /// Clamps `requested` into `1..=num_pages`. An empty collection still has
    /// one (empty) page, so out-of-range requests never fail.
    pub fn new(total: usize, requested: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let num_pages = total.div_ceil(per_page).max(1);
        let number = requested.clamp(1, num_pages);
        Self {
            number,
            num_pages,
            per_page,
            total,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn fill<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            items,
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pages an already materialized collection.
pub fn paginate<T>(items: Vec<T>, requested: usize, per_page: usize) -> Page<T> {
    let window = PageWindow::new(items.len(), requested, per_page);
    let slice = items
        .into_iter()
        .skip(window.offset())
        .take(window.limit())
        .collect();
    window.fill(slice)
}
