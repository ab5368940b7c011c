//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Task description.
        description -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
