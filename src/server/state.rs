use crate::book::CustomerBook;
use crate::location::LocationPipeline;
use std::sync::Mutex;

pub struct AppState {
    pub pipeline: LocationPipeline,
    pub book: Mutex<CustomerBook>,
    pub phone_prefix: String,
}
