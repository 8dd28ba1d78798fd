//! Doubly linked list with stable entry handles.
//!
//! Links live in a `Slab`, so an entry handle is just the slab key. Adding
//! returns the handle, removing by handle is O(1) and never scans, and the
//! relative order of the remaining values is preserved.

use slab::Slab;

/// Handle of a value inside one [`TupleList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListEntry(usize);

#[derive(Debug, Clone)]
struct Link<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Insertion-ordered list with O(1) append and O(1) removal by handle.
#[derive(Debug, Clone)]
pub struct TupleList<T> {
    links: Slab<Link<T>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<T> Default for TupleList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TupleList<T> {
    pub fn new() -> Self {
        Self {
            links: Slab::new(),
            head: None,
            tail: None,
        }
    }

    /// Appends `value` and returns its handle.
    pub fn add(&mut self, value: T) -> ListEntry {
        let key = self.links.insert(Link {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.links[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        ListEntry(key)
    }

    /// Removes the value behind `entry`.
    ///
    /// # Panics
    /// Panics if the entry was already removed.
    pub fn remove(&mut self, entry: ListEntry) -> T {
        let Some(link) = self.links.try_remove(entry.0) else {
            panic!("Impossible state: list entry {:?} was already removed", entry);
        };
        match link.prev {
            Some(prev) => self.links[prev].next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => self.links[next].prev = link.prev,
            None => self.tail = link.prev,
        }
        link.value
    }

    pub fn get(&self, entry: ListEntry) -> Option<&T> {
        self.links.get(entry.0).map(|link| &link.value)
    }

    pub fn first(&self) -> Option<&T> {
        self.head.map(|key| &self.links[key].value)
    }

    pub fn last(&self) -> Option<&T> {
        self.tail.map(|key| &self.links[key].value)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
        }
    }

    /// Iterates handles and values from head to tail.
    pub fn entries(&self) -> impl Iterator<Item = (ListEntry, &T)> + '_ {
        EntryIter {
            list: self,
            next: self.head,
        }
    }

    /// Removes every value, returning them from head to tail.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len());
        while let Some(head) = self.head {
            values.push(self.remove(ListEntry(head)));
        }
        values
    }
}

impl<T: Copy> TupleList<T> {
    /// Copies the values out, head to tail.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}

pub struct Iter<'a, T> {
    list: &'a TupleList<T>,
    next: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let link = &self.list.links[self.next?];
        self.next = link.next;
        Some(&link.value)
    }
}

struct EntryIter<'a, T> {
    list: &'a TupleList<T>,
    next: Option<usize>,
}

impl<'a, T> Iterator for EntryIter<'a, T> {
    type Item = (ListEntry, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        let link = &self.list.links[key];
        self.next = link.next;
        Some((ListEntry(key), &link.value))
    }
}

impl<'a, T> IntoIterator for &'a TupleList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
