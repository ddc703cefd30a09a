//! Built-in grid definitions

mod employee;

pub use employee::EMPLOYEE;

use crate::definition::GridDefinition;

/// All registered grids
pub static ALL: &[&GridDefinition] = &[&EMPLOYEE];

/// Find a grid by name
pub fn by_name(name: &str) -> Option<&'static GridDefinition> {
    ALL.iter().copied().find(|grid| grid.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    ALL.iter().map(|grid| grid.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("employee").map(|g| g.table), Some("employee"));
        assert!(by_name("customer").is_none());
        assert_eq!(names().collect::<Vec<_>>(), vec!["employee"]);
    }
}
