//! Customer book: records, photos, storage, search and sharing.
//!
//! The location pipeline never touches the book; callers move results across
//! through [`ContactForm`].

pub mod customer;
pub mod photo;
pub mod search;
pub mod share;
pub mod store;

pub use customer::{ContactForm, Customer, Photo, NO_COORDINATES};
pub use photo::PhotoError;
pub use share::{ShareFormat, Sharer};
pub use store::{CustomerBook, StoreError};
