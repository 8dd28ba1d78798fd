//! Shift scheduling fixtures.

use streamforge_core::PlanningId;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Employee {
    pub id: u32,
    pub name: String,
    /// Days the employee asked not to work.
    pub unavailable_days: Vec<u32>,
}

impl Employee {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            unavailable_days: Vec::new(),
        }
    }

    pub fn unavailable_on(mut self, day: u32) -> Self {
        self.unavailable_days.push(day);
        self
    }
}

/// A shift on one day, from `start` to `end` hours, assigned to an
/// employee or not.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shift {
    pub id: u32,
    pub day: u32,
    pub start: i64,
    pub end: i64,
    pub employee: Option<u32>,
}

impl Shift {
    pub fn new(id: u32, day: u32, start: i64, end: i64) -> Self {
        Self {
            id,
            day,
            start,
            end,
            employee: None,
        }
    }

    pub fn assigned_to(mut self, employee: u32) -> Self {
        self.employee = Some(employee);
        self
    }

    pub fn hours(&self) -> i64 {
        self.end - self.start
    }

    /// Hours both shifts run at the same time; zero on different days.
    pub fn overlap(&self, other: &Shift) -> i64 {
        if self.day != other.day {
            return 0;
        }
        (self.end.min(other.end) - self.start.max(other.start)).max(0)
    }
}

impl PlanningId for Shift {
    type Id = u32;

    fn planning_id(&self) -> u32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Shift::new(0, 1, 8, 16);
        let b = Shift::new(1, 1, 12, 20);
        let c = Shift::new(2, 2, 12, 20);
        assert_eq!(a.overlap(&b), 4);
        assert_eq!(b.overlap(&a), 4);
        assert_eq!(a.overlap(&c), 0);
        assert_eq!(a.hours(), 8);
    }
}
