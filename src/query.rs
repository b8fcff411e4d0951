use serde::Deserialize;

/// SQL query builder for the admin product listing
/// Builds a single parameterized query with filters, sorting, and pagination
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl SQLQueryBuilder {
    /// Creates a new SQLQueryBuilder with default values
    pub fn new() -> Self {
        Self {
            base_query: "SELECT id, category_id, name, description, price, photo_url, \
                         visible, sold_out, kind, ingredient_id FROM products"
                .to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: 20,
            offset: 0,
        }
    }

    /// Adds a search filter for partial name matching (case-insensitive)
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("name ILIKE ${}", param_index));
        self.params.push(format!("%{}%", search));
    }

    /// Adds a category filter
    /// The parameter is carried as text and cast server-side
    pub fn add_category_filter(&mut self, category_id: i32) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("category_id = ${}::int", param_index));
        self.params.push(category_id.to_string());
    }

    /// Adds price range filters (min and/or max), both bounds inclusive
    pub fn add_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        if let Some(min_price) = min {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("price >= ${}::numeric", param_index));
            self.params.push(min_price.to_string());
        }

        if let Some(max_price) = max {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("price <= ${}::numeric", param_index));
            self.params.push(max_price.to_string());
        }
    }

    /// Sets the sort order for the query
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::Price => "price",
            SortField::Name => "name",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}", field_name, order_str));
    }

    /// Sets pagination parameters from a 1-indexed page number
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT and OFFSET are validated integers, inlined directly
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

impl Default for SQLQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters extracted from the HTTP request
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Search term for partial name matching (case-insensitive)
    pub search: Option<String>,
    /// Filter by category
    pub category_id: Option<i32>,
    /// Minimum price filter (inclusive)
    pub min_price: Option<f64>,
    /// Maximum price filter (inclusive)
    pub max_price: Option<f64>,
    /// Sort field: "price" or "name"
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 20)
    pub limit: Option<u32>,
}

/// Sort field options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Name,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized query parameters
#[derive(Debug)]
pub struct ValidatedQuery {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Validation error type for query parameters
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes query parameters
    pub fn validate(params: QueryParams) -> Result<ValidatedQuery, ValidationError> {
        let search = Self::normalize_string(params.search);

        if let Some(category_id) = params.category_id {
            if category_id <= 0 {
                return Err(ValidationError {
                    message: "category_id must be a positive number".to_string(),
                });
            }
        }

        let min_price = if let Some(price) = params.min_price {
            Self::validate_price(price, "min_price")?;
            Some(price)
        } else {
            None
        };

        let max_price = if let Some(price) = params.max_price {
            Self::validate_price(price, "max_price")?;
            Some(price)
        } else {
            None
        };

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError {
                    message: "min_price cannot be greater than max_price".to_string(),
                });
            }
        }

        let sort_field = if let Some(sort_str) = params.sort {
            Some(Self::parse_sort_field(&sort_str)?)
        } else {
            None
        };

        let sort_order = if let Some(order_str) = params.order {
            Self::parse_sort_order(&order_str)?
        } else {
            SortOrder::Asc
        };

        let page = if let Some(p) = params.page {
            Self::validate_pagination_param(p, "page")?;
            p
        } else {
            1
        };

        let limit = if let Some(l) = params.limit {
            Self::validate_pagination_param(l, "limit")?;
            l
        } else {
            20
        };

        Ok(ValidatedQuery {
            search,
            category_id: params.category_id,
            min_price,
            max_price,
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Normalizes string parameters by trimming whitespace
    /// Returns None if the string is empty or whitespace-only
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    /// Validates that a price bound is positive and finite
    fn validate_price(price: f64, param_name: &str) -> Result<(), ValidationError> {
        if price <= 0.0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number", param_name),
            });
        }
        if price.is_nan() || price.is_infinite() {
            return Err(ValidationError {
                message: format!("{} must be a valid number", param_name),
            });
        }
        Ok(())
    }

    fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
        match s.to_lowercase().as_str() {
            "price" => Ok(SortField::Price),
            "name" => Ok(SortField::Name),
            _ => Err(ValidationError {
                message: format!("Invalid sort field '{}'. Must be 'price' or 'name'", s),
            }),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, ValidationError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }

    /// Pagination parameters must be positive
    fn validate_pagination_param(value: u32, param_name: &str) -> Result<(), ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number (greater than 0)", param_name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_builder_basic_query() {
        let builder = SQLQueryBuilder::new();
        let (query, params) = builder.build();

        assert!(query.contains("FROM products"));
        assert!(query.contains("LIMIT"));
        assert!(query.contains("OFFSET"));
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_sql_builder_with_search() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_search_filter("calabresa");
        let (query, params) = builder.build();

        assert!(query.contains("WHERE"));
        assert!(query.contains("name ILIKE $1"));
        assert_eq!(params[0], "%calabresa%");
    }

    #[test]
    fn test_sql_builder_with_category_filter() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_category_filter(3);
        let (query, params) = builder.build();

        assert!(query.contains("category_id = $1::int"));
        assert_eq!(params[0], "3");
    }

    #[test]
    fn test_sql_builder_with_price_range() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_price_range(Some(5.0), Some(10.0));
        let (query, params) = builder.build();

        assert!(query.contains("price >= $1::numeric"));
        assert!(query.contains("price <= $2::numeric"));
        assert_eq!(params[0], "5");
        assert_eq!(params[1], "10");
    }

    #[test]
    fn test_sql_builder_with_sorting() {
        let mut builder = SQLQueryBuilder::new();
        builder.set_sort(SortField::Price, SortOrder::Asc);
        let (query, _) = builder.build();

        assert!(query.contains("ORDER BY price ASC"));
    }

    #[test]
    fn test_sql_builder_with_pagination() {
        let mut builder = SQLQueryBuilder::new();
        builder.set_pagination(2, 20);
        let (query, _params) = builder.build();

        assert!(query.contains("LIMIT 20"));
        assert!(query.contains("OFFSET 20"));
    }

    #[test]
    fn test_sql_builder_combined_filters() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_search_filter("pizza");
        builder.add_category_filter(1);
        builder.add_price_range(Some(10.0), Some(60.0));
        builder.set_sort(SortField::Name, SortOrder::Desc);
        builder.set_pagination(1, 10);

        let (query, params) = builder.build();

        assert!(query.contains("name ILIKE $1"));
        assert!(query.contains("AND"));
        assert!(query.contains("category_id = $2::int"));
        assert!(query.contains("price >= $3::numeric"));
        assert!(query.contains("price <= $4::numeric"));
        assert!(query.contains("ORDER BY name DESC"));

        assert_eq!(params[0], "%pizza%");
        assert_eq!(params[1], "1");
        assert_eq!(params[2], "10");
        assert_eq!(params[3], "60");
    }

    #[test]
    fn test_normalize_string_with_whitespace() {
        assert_eq!(
            QueryValidator::normalize_string(Some("  test  ".to_string())),
            Some("test".to_string())
        );
    }

    #[test]
    fn test_normalize_string_empty() {
        assert_eq!(QueryValidator::normalize_string(Some("   ".to_string())), None);
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(QueryValidator::validate_price(10.0, "price").is_ok());
        assert!(QueryValidator::validate_price(0.0, "price").is_err());
        assert!(QueryValidator::validate_price(-5.0, "price").is_err());
        assert!(QueryValidator::validate_price(f64::NAN, "price").is_err());
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!(
            QueryValidator::parse_sort_field("price").unwrap(),
            SortField::Price
        );
        assert_eq!(
            QueryValidator::parse_sort_field("NAME").unwrap(),
            SortField::Name
        );
        assert!(QueryValidator::parse_sort_field("rating").is_err());
    }

    #[test]
    fn test_parse_sort_order() {
        assert_eq!(QueryValidator::parse_sort_order("asc").unwrap(), SortOrder::Asc);
        assert_eq!(QueryValidator::parse_sort_order("DESC").unwrap(), SortOrder::Desc);
        assert!(QueryValidator::parse_sort_order("sideways").is_err());
    }

    #[test]
    fn test_validate_full_query_with_defaults() {
        let params = QueryParams {
            search: None,
            category_id: None,
            min_price: None,
            max_price: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.page, 1);
        assert_eq!(validated.limit, 20);
        assert_eq!(validated.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_validate_price_range_inverted() {
        let params = QueryParams {
            search: None,
            category_id: None,
            min_price: Some(10.0),
            max_price: Some(5.0),
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page() {
        let params = QueryParams {
            search: None,
            category_id: None,
            min_price: None,
            max_price: None,
            sort: None,
            order: None,
            page: Some(0),
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_category() {
        let params = QueryParams {
            search: None,
            category_id: Some(0),
            min_price: None,
            max_price: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }
}
