#![allow(dead_code)]

pub mod collaborators;
pub mod stages;

pub use collaborators::*;
pub use stages::*;

use relaygraph::item::Item;

pub fn sample_item(id: &str) -> Item {
    Item::builder(id, "alice@example.com", format!("body of {id}"))
        .subject(format!("subject of {id}"))
        .thread_context(format!("thread-{id}"))
        .build()
}

pub fn sample_batch(n: usize) -> Vec<Item> {
    (1..=n).map(|i| sample_item(&format!("item-{i}"))).collect()
}
