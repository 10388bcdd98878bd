//! Tree navigation functions for FHIRPath.

use std::collections::VecDeque;

use crate::error::Result;
use crate::value::Collection;

/// Direct children of every item, in document order
pub fn children(collection: Collection) -> Result<Collection> {
    let mut result = Collection::empty();
    for item in &collection {
        result.extend(item.all_children());
    }
    Ok(result)
}

/// All nodes below the input, breadth first; equivalent to `repeat(children())`
pub fn descendants(collection: Collection) -> Result<Collection> {
    let mut result = Collection::empty();
    let mut queue: VecDeque<_> = collection.into_iter().collect();
    while let Some(item) = queue.pop_front() {
        for child in item.all_children() {
            queue.push_back(child.clone());
            result.push(child);
        }
    }
    Ok(result)
}
