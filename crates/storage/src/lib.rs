pub mod db;

pub use db::{
    create_db, get_all_confirmed_invoices, insert_confirmed_invoice, DbPool, StorageError,
};
