//! Manage database connections and domain queries.
//!
//! This module tree exposes helpers for creating pooled Diesel connections,
//! running embedded migrations, auditing backend capabilities, and executing
//! single-statement queries grouped by relation.

mod announcements;
mod audit;
mod connection;
mod donors;
mod insults;
mod migrations;

#[cfg(test)]
mod tests;

#[cfg(feature = "postgres")]
pub use self::audit::audit_postgres_features;
#[cfg(feature = "sqlite")]
pub use self::audit::audit_sqlite_features;
pub use self::{
    announcements::{
        create_announcement,
        delete_all_announcements,
        delete_announcement,
        list_active_announcements,
        list_announcements,
        update_announcement,
    },
    connection::{Backend, DbConnection, DbPool, MIGRATIONS, establish_pool},
    donors::{
        admin_flag_for,
        code_exists,
        code_for_email,
        delete_donor,
        find_donor_by_email,
        list_donors,
        promote_donor,
        register_donor,
    },
    insults::{
        ApprovedRow,
        approve_insult,
        delete_insult,
        find_duplicate,
        get_insult,
        increment_click_count,
        insert_insult,
        list_approved_random,
        list_insults_by_email,
        list_insults_by_status,
        reject_insult,
    },
    migrations::{apply_migrations, run_migrations},
};
