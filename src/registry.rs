//! Collection registry
//!
//! The fixed, ordered list of collections that participate in backup and
//! restore. This is the single source of truth for snapshot completeness:
//! every export emits exactly these collections, and a snapshot missing
//! any of them fails validation.
//!
//! Maintenance contract: a new business entity added elsewhere in the
//! application is silently excluded from every backup until its
//! collection name is added here.

/// Every collection included in a backup, in export order.
pub const COLLECTIONS: [&str; 10] = [
    "customers",
    "suppliers",
    "orders",
    "payments",
    "customerChecks",
    "personalChecks",
    "tasks",
    "calendarEvents",
    "reminders",
    "settings",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_no_duplicates() {
        let mut names: Vec<_> = COLLECTIONS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COLLECTIONS.len());
    }
}
