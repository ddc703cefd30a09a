//! Employee grid
//!
//! Employees joined with their profile name in the active language,
//! restricted to employees associated with at least one allowed shop.

use crate::definition::{Col, GridDefinition, LookupJoin, Projected, ScopeMembership};
use crate::filters::{FilterField, FilterKind};
use crate::sorts::SortField;
use crate::values::ColumnType;

const PROFILE_NAME: Col = Col::new("pl", "name");

pub static EMPLOYEE: GridDefinition = GridDefinition {
    name: "employee",
    table: "employee",
    alias: "e",
    primary_key: "id_employee",
    projection: &[
        Projected::Column(Col::new("e", "id_employee")),
        Projected::Column(Col::new("e", "firstname")),
        Projected::Column(Col::new("e", "lastname")),
        Projected::Column(Col::new("e", "email")),
        Projected::Column(Col::new("e", "id_profile")),
        Projected::Column(Col::new("e", "active")),
        Projected::Column(Col::new("e", "last_connection_date")),
        Projected::Lookup {
            column: PROFILE_NAME,
            alias: "profile_name",
        },
    ],
    joins: &[LookupJoin {
        table: "profile_lang",
        alias: "pl",
        on: &[(Col::new("e", "id_profile"), Col::new("pl", "id_profile"))],
        lang_column: Some("id_lang"),
    }],
    scope: Some(ScopeMembership {
        table: "employee_shop",
        alias: "es",
        entity_column: "id_employee",
        scope_column: "id_shop",
    }),
    filters: &[
        FilterField::new("id_employee", Col::new("e", "id_employee"), FilterKind::Exact, ColumnType::Int),
        FilterField::new("firstname", Col::new("e", "firstname"), FilterKind::PartialText, ColumnType::Text),
        FilterField::new("lastname", Col::new("e", "lastname"), FilterKind::PartialText, ColumnType::Text),
        FilterField::new("email", Col::new("e", "email"), FilterKind::PartialText, ColumnType::Text),
        FilterField::new("id_profile", Col::new("e", "id_profile"), FilterKind::OneOf, ColumnType::Int),
        FilterField::new("profile_name", PROFILE_NAME, FilterKind::PartialText, ColumnType::Text),
        FilterField::new("active", Col::new("e", "active"), FilterKind::Exact, ColumnType::Bool),
        FilterField::new(
            "last_connection_date",
            Col::new("e", "last_connection_date"),
            FilterKind::Range,
            ColumnType::Date,
        ),
    ],
    sorts: &[
        SortField { name: "id_employee", column: Col::new("e", "id_employee") },
        SortField { name: "firstname", column: Col::new("e", "firstname") },
        SortField { name: "lastname", column: Col::new("e", "lastname") },
        SortField { name: "email", column: Col::new("e", "email") },
        SortField { name: "profile_name", column: PROFILE_NAME },
        SortField { name: "active", column: Col::new("e", "active") },
        SortField { name: "last_connection_date", column: Col::new("e", "last_connection_date") },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_fields_are_filterable_or_key() {
        for name in EMPLOYEE.sort_names() {
            assert!(EMPLOYEE.filter(name).is_some(), "{} has no filter", name);
        }
    }

    #[test]
    fn test_password_columns_are_not_exposed() {
        assert!(EMPLOYEE.filter("passwd").is_none());
        assert!(EMPLOYEE.sort("passwd").is_none());
        assert!(EMPLOYEE.projection.iter().all(|item| match item {
            Projected::Column(col) => col.column != "passwd",
            Projected::Lookup { alias, .. } => *alias != "passwd",
        }));
        assert_eq!(EMPLOYEE.primary_key_col(), Col::new("e", "id_employee"));
    }
}
