//! Cloud Controller v2 list filters (`q=` query parameters)

use super::ControlApiError;

/// Characters the `q` grammar treats as separators. The CC has no escape
/// syntax, so values containing them cannot be filtered on exactly.
const RESERVED: &[char] = &[',', ';'];

/// Field a list request can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    ServiceGuid,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::ServiceGuid => "service_guid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    In,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl FilterOperator {
    fn token(&self) -> &'static str {
        match self {
            FilterOperator::Equal => ":",
            FilterOperator::In => " IN ",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
        }
    }
}

/// One `field<op>values` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: FilterField,
    pub operator: FilterOperator,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(field: FilterField, operator: FilterOperator, values: Vec<String>) -> Self {
        Self {
            field,
            operator,
            values,
        }
    }

    pub fn eq(field: FilterField, value: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Equal, vec![value.into()])
    }

    /// Exact-name filter used for every name-based lookup
    pub fn name(value: impl Into<String>) -> Self {
        Self::eq(FilterField::Name, value)
    }

    /// Reject values the CC would split into extra terms or list items
    pub fn validate(&self) -> Result<(), ControlApiError> {
        match self.values.iter().find(|v| v.contains(RESERVED)) {
            Some(value) => Err(ControlApiError::InvalidFilter {
                field: self.field.as_str(),
                value: value.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Value of the `q` parameter, e.g. `name:my-db` or `name IN a,b`
    pub fn to_query_value(&self) -> String {
        format!(
            "{}{}{}",
            self.field.as_str(),
            self.operator.token(),
            self.values.join(",")
        )
    }

    /// `q` pairs for a list of filters, one pair per filter
    pub fn to_query_pairs(filters: &[Filter]) -> Result<Vec<(&'static str, String)>, ControlApiError> {
        filters
            .iter()
            .map(|f| {
                f.validate()?;
                Ok(("q", f.to_query_value()))
            })
            .collect()
    }
}
