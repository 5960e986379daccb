//! ORDER BY, LIMIT and OFFSET

use super::builder::QueryBuilder;
use super::types::OrderDirection;

impl QueryBuilder {
    pub fn order_by(self, column: &str) -> Self {
        self.order_by_direction(column, OrderDirection::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by_direction(column, OrderDirection::Desc)
    }

    /// Append a sort key; earlier keys take precedence
    pub fn order_by_direction(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// LIMIT `per_page` rows starting at `page` (1-based; lower pages clamp to 1)
    pub fn paginate(self, per_page: i64, page: i64) -> Self {
        let skip = (page.max(1) - 1).saturating_mul(per_page);
        self.limit(per_page).offset(skip)
    }
}
