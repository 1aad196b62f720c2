use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::green::GreenElement;

const MAX_POOLED: usize = 16;

/// Reusable child buffers, scoped to one parse
///
/// Buffers go back to the pool when the [`PooledList`] drops, so early
/// returns and aborted parses release them too.
#[derive(Default)]
pub(crate) struct ListPool {
    free: Rc<RefCell<Vec<Vec<GreenElement>>>>,
}

impl ListPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn acquire(&self) -> PooledList {
        let items = self.free.borrow_mut().pop().unwrap_or_default();
        PooledList {
            items,
            pool: Rc::clone(&self.free),
        }
    }

    #[cfg(test)]
    fn free_count(&self) -> usize {
        self.free.borrow().len()
    }
}

pub(crate) struct PooledList {
    items: Vec<GreenElement>,
    pool: Rc<RefCell<Vec<Vec<GreenElement>>>>,
}

impl Deref for PooledList {
    type Target = Vec<GreenElement>;

    fn deref(&self) -> &Vec<GreenElement> {
        &self.items
    }
}

impl DerefMut for PooledList {
    fn deref_mut(&mut self) -> &mut Vec<GreenElement> {
        &mut self.items
    }
}

impl Drop for PooledList {
    fn drop(&mut self) {
        let mut items = std::mem::take(&mut self.items);
        items.clear();
        let mut free = self.pool.borrow_mut();
        if free.len() < MAX_POOLED {
            free.push(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::GreenToken;
    use crate::syntax_kind::SyntaxKind;

    #[test]
    fn test_buffers_return_to_pool() {
        let pool = ListPool::new();
        {
            let mut list = pool.acquire();
            list.push(GreenToken::new(SyntaxKind::NameToken, "a").into());
            assert_eq!(pool.free_count(), 0);
        }
        assert_eq!(pool.free_count(), 1);

        let list = pool.acquire();
        assert!(list.is_empty());
        assert!(list.capacity() >= 1);
    }

    #[test]
    fn test_nested_lists_use_distinct_buffers() {
        let pool = ListPool::new();
        let mut outer = pool.acquire();
        let mut inner = pool.acquire();
        inner.push(GreenToken::new(SyntaxKind::NameToken, "b").into());
        outer.push(GreenToken::new(SyntaxKind::NameToken, "a").into());
        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 1);
        drop(inner);
        drop(outer);
        assert_eq!(pool.free_count(), 2);
    }
}
