//! Page requests and result pages
//!
//! A [`Pageable`] asks for one zero-based page of a fixed size, optionally
//! sorted. A [`Page`] holds the content of that page together with the total
//! number of elements across all pages.

use std::future::Future;

use crate::query::Direction;

/// Default page size when a request does not give one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a request may ask for
pub const MAX_PAGE_SIZE: u32 = 2000;

/// One `property,direction` sort term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    property: String,
    direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }

    /// Parses `property` or `property,asc|desc`
    pub fn parse(value: &str) -> Result<Self, String> {
        let mut parts = value.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default();
        if property.is_empty() {
            return Err(format!("Invalid sort: {:?}", value));
        }

        let direction = match parts.next() {
            Some(direction) => direction.parse()?,
            None => Direction::Asc,
        };
        if parts.next().is_some() {
            return Err(format!("Invalid sort: {:?}", value));
        }

        Ok(Self {
            property: property.to_string(),
            direction,
        })
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Ordered list of sort terms; empty means unsorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    pub fn and(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

/// Request for one page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    page: u32,
    size: u32,
    sort: Sort,
}

impl Pageable {
    /// Creates an unsorted page request
    ///
    /// # Returns
    /// * `Err(String)` - If `size` is zero or larger than [`MAX_PAGE_SIZE`]
    pub fn new(page: u32, size: u32) -> Result<Self, String> {
        if size == 0 {
            return Err("Page size must be at least 1".to_string());
        }
        if size > MAX_PAGE_SIZE {
            return Err(format!("Page size cannot exceed {}", MAX_PAGE_SIZE));
        }

        Ok(Self {
            page,
            size,
            sort: Sort::unsorted(),
        })
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page_number(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.size
    }

    /// Index of the first element of this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::unsorted(),
        }
    }
}

/// One page of content plus the total element count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    pageable: Pageable,
    total: u64,
}

impl<T> Page<T> {
    /// Creates a page with a known total
    ///
    /// A total that cannot hold the content already on this page (a count
    /// taken before rows were added) is raised to `offset + content.len()`.
    pub fn new(content: Vec<T>, pageable: Pageable, total: u64) -> Self {
        let offset = pageable.offset();
        let total = if !content.is_empty() && offset + u64::from(pageable.page_size()) > total {
            offset + content.len() as u64
        } else {
            total
        };

        Self {
            content,
            pageable,
            total,
        }
    }

    /// Creates a page, calling `count` only when the content cannot tell the total
    ///
    /// The total is known without counting on a first page that is not full,
    /// and on any later non-empty page that is not full.
    pub async fn with_count_query<F, Fut, E>(
        content: Vec<T>,
        pageable: Pageable,
        count: F,
    ) -> Result<Self, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, E>>,
    {
        let offset = pageable.offset();
        let size = pageable.page_size() as usize;
        let len = content.len();

        let total = if offset == 0 && size > len {
            len as u64
        } else if offset > 0 && len != 0 && size > len {
            offset + len as u64
        } else {
            count().await?
        };

        Ok(Self::new(content, pageable, total))
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn pageable(&self) -> &Pageable {
        &self.pageable
    }

    /// Zero-based page number
    pub fn number(&self) -> u32 {
        self.pageable.page_number()
    }

    pub fn size(&self) -> u32 {
        self.pageable.page_size()
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size()))
    }

    pub fn is_first(&self) -> bool {
        self.number() == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number()) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number() > 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            pageable: self.pageable,
            total: self.total,
        }
    }
}
