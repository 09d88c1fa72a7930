use hashbrown::HashMap;

use crate::models::{Coordinate, MemberEntry};

/// Members grouped by resolved coordinate, in first-seen order.
///
/// Members whose addresses geocode to bit-identical coordinates (a shared
/// household, a building with several flats) end up in the same point.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    points: Vec<(Coordinate, Vec<MemberEntry>)>,
    index: HashMap<Coordinate, usize>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, coordinate: Coordinate, entry: MemberEntry) {
        match self.index.get(&coordinate) {
            Some(&i) => self.points[i].1.push(entry),
            None => {
                self.index.insert(coordinate, self.points.len());
                self.points.push((coordinate, vec![entry]));
            }
        }
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<&[MemberEntry]> {
        self.index
            .get(coordinate)
            .map(|&i| self.points[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &[MemberEntry])> {
        self.points
            .iter()
            .map(|(coordinate, members)| (*coordinate, members.as_slice()))
    }

    /// Number of distinct coordinates
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.points.iter().map(|(_, members)| members.len()).sum()
    }
}
