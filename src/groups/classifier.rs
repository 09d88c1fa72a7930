//! First-match classification of resolved members into overlay groups.
//!
//! Every member lands in the base layer. Each member is then offered to the
//! groups in configuration order and taken by the first group that lists
//! the name and has not claimed it yet. A claimed name is spent for that
//! group only, so a second person with the same name falls through to a
//! later group (or stays base-only) while other groups may still take it.

use hashbrown::HashSet;
use serde::Serialize;
use tracing::{debug, warn};

use super::MatchGroup;
use crate::models::{Coordinate, MemberEntry};
use crate::pipeline::Aggregation;

/// One map point: the members shown there and the popup shared by every
/// layer that shows the point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub members: Vec<MemberEntry>,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupLayer {
    pub name: String,
    pub color: String,
    pub markers: Vec<Marker>,
}

impl GroupLayer {
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.markers
            .iter()
            .flat_map(|m| m.members.iter().map(|e| e.name.as_str()))
    }
}

/// Names a group listed but never claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unmatched {
    pub group: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub base: Vec<Marker>,
    pub groups: Vec<GroupLayer>,
    /// Only groups with at least one unclaimed name appear here.
    pub unmatched: Vec<Unmatched>,
}

impl Classification {
    pub fn group(&self, name: &str) -> Option<&GroupLayer> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn unmatched_for(&self, group: &str) -> &[String] {
        self.unmatched
            .iter()
            .find(|u| u.group == group)
            .map(|u| u.names.as_slice())
            .unwrap_or(&[])
    }
}

/// Per-run claim state for one group, kept apart from its configuration.
struct Claims<'g> {
    group: &'g MatchGroup,
    wanted: HashSet<&'g str>,
    claimed: HashSet<&'g str>,
}

impl<'g> Claims<'g> {
    fn new(group: &'g MatchGroup) -> Self {
        Self {
            group,
            wanted: group.matches.iter().map(String::as_str).collect(),
            claimed: HashSet::new(),
        }
    }

    /// Claim `name` if this group lists it and has not claimed it yet.
    fn try_claim(&mut self, name: &str) -> bool {
        match self.wanted.get(name) {
            Some(&listed) => self.claimed.insert(listed),
            None => false,
        }
    }

    fn unclaimed(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.group
            .matches
            .iter()
            .map(String::as_str)
            .filter(|n| !self.claimed.contains(n) && seen.insert(*n))
            .map(str::to_string)
            .collect()
    }
}

pub fn classify(aggregation: &Aggregation, groups: &[MatchGroup]) -> Classification {
    let mut claims: Vec<Claims> = groups.iter().map(Claims::new).collect();
    let mut layers: Vec<GroupLayer> = groups
        .iter()
        .map(|g| GroupLayer {
            name: g.name.clone(),
            color: g.color.clone(),
            markers: Vec::new(),
        })
        .collect();
    let mut base = Vec::with_capacity(aggregation.len());

    for (coordinate, members) in aggregation.iter() {
        let popup = popup_text(members);
        let mut per_group: Vec<Vec<MemberEntry>> = vec![Vec::new(); groups.len()];

        for member in members {
            if let Some(i) = claims.iter_mut().position(|c| c.try_claim(&member.name)) {
                debug!("'{}' claimed by group '{}'", member.name, groups[i].name);
                per_group[i].push(member.clone());
            }
        }

        for (layer, claimed) in layers.iter_mut().zip(per_group) {
            if !claimed.is_empty() {
                layer.markers.push(Marker {
                    coordinate,
                    members: claimed,
                    popup: popup.clone(),
                });
            }
        }

        base.push(Marker {
            coordinate,
            members: members.to_vec(),
            popup,
        });
    }

    let unmatched = claims
        .iter()
        .filter_map(|c| {
            let names = c.unclaimed();
            if names.is_empty() {
                return None;
            }
            warn!(
                "Group '{}' has {} unmatched names: {}",
                c.group.name,
                names.len(),
                names.join(", ")
            );
            Some(Unmatched {
                group: c.group.name.clone(),
                names,
            })
        })
        .collect();

    Classification {
        base,
        groups: layers,
        unmatched,
    }
}

/// Popup for a point: every member's name, address and birthday.
fn popup_text(members: &[MemberEntry]) -> String {
    members
        .iter()
        .map(MemberEntry::popup_line)
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, address: &str) -> MemberEntry {
        MemberEntry {
            name: name.into(),
            address: address.into(),
            birthday: None,
        }
    }

    fn aggregation(points: Vec<(f64, Vec<&str>)>) -> Aggregation {
        let mut agg = Aggregation::new();
        for (i, (lat, names)) in points.into_iter().enumerate() {
            for name in names {
                agg.push(
                    Coordinate::new(lat, 12.0),
                    entry(name, &format!("Vej {}, 2800 X", i)),
                );
            }
        }
        agg
    }

    #[test]
    fn test_no_groups_is_base_only() {
        let agg = aggregation(vec![(55.0, vec!["A", "B"]), (56.0, vec!["C"])]);
        let result = classify(&agg, &[]);

        assert_eq!(result.base.len(), 2);
        assert_eq!(result.base[0].members.len(), 2);
        assert!(result.groups.is_empty());
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_duplicate_name_claimed_once_per_group() {
        let agg = aggregation(vec![(55.0, vec!["A"]), (56.0, vec!["A"])]);
        let groups = vec![MatchGroup::new("Friends", "green", &["A", "A"])];

        let result = classify(&agg, &groups);

        let friends = result.group("Friends").unwrap();
        assert_eq!(friends.markers.len(), 1);
        assert_eq!(friends.markers[0].coordinate, Coordinate::new(55.0, 12.0));
        assert_eq!(friends.member_names().collect::<Vec<_>>(), vec!["A"]);
        assert!(result.unmatched_for("Friends").is_empty());
        // Both points are still on the base layer
        assert_eq!(result.base.len(), 2);
    }

    #[test]
    fn test_duplicate_at_same_point_claimed_once() {
        let agg = aggregation(vec![(55.0, vec!["A", "A"])]);
        let groups = vec![MatchGroup::new("Friends", "green", &["A"])];

        let result = classify(&agg, &groups);
        assert_eq!(result.group("Friends").unwrap().member_names().count(), 1);
        assert_eq!(result.base[0].members.len(), 2);
    }

    #[test]
    fn test_first_matching_group_wins() {
        let agg = aggregation(vec![(55.0, vec!["A"])]);
        let groups = vec![
            MatchGroup::new("Board", "red", &["A"]),
            MatchGroup::new("Friends", "green", &["A"]),
        ];

        let result = classify(&agg, &groups);

        assert_eq!(result.group("Board").unwrap().member_names().count(), 1);
        assert_eq!(result.group("Friends").unwrap().member_names().count(), 0);
        assert_eq!(result.unmatched_for("Friends"), &["A".to_string()]);
    }

    #[test]
    fn test_same_name_in_two_groups() {
        let agg = aggregation(vec![(55.0, vec!["A"]), (56.0, vec!["A"])]);
        let groups = vec![
            MatchGroup::new("Board", "red", &["A"]),
            MatchGroup::new("Friends", "green", &["A"]),
        ];

        let result = classify(&agg, &groups);

        let board = result.group("Board").unwrap();
        let friends = result.group("Friends").unwrap();
        assert_eq!(board.member_names().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(friends.member_names().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(board.markers[0].coordinate, Coordinate::new(55.0, 12.0));
        assert_eq!(friends.markers[0].coordinate, Coordinate::new(56.0, 12.0));
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let agg = aggregation(vec![(55.0, vec!["anna berg"])]);
        let groups = vec![MatchGroup::new("Board", "red", &["Anna Berg"])];

        let result = classify(&agg, &groups);

        assert!(result.group("Board").unwrap().markers.is_empty());
        assert_eq!(
            result.unmatched,
            vec![Unmatched {
                group: "Board".into(),
                names: vec!["Anna Berg".into()],
            }]
        );
    }

    #[test]
    fn test_group_marker_shares_point_popup() {
        let agg = aggregation(vec![(55.0, vec!["A", "B"])]);
        let groups = vec![MatchGroup::new("Board", "red", &["B"])];

        let result = classify(&agg, &groups);

        let marker = &result.group("Board").unwrap().markers[0];
        assert_eq!(marker.members.len(), 1);
        assert_eq!(marker.popup, result.base[0].popup);
        assert!(marker.popup.starts_with("A<br>Vej 0, 2800 X<br>"));
        assert!(marker.popup.contains("<br>B<br>"));
    }

    #[test]
    fn test_unmatched_lists_each_name_once_in_order() {
        let agg = aggregation(vec![(55.0, vec!["B"])]);
        let groups = vec![MatchGroup::new("Board", "red", &["C", "B", "A", "C"])];

        let result = classify(&agg, &groups);
        assert_eq!(
            result.unmatched_for("Board"),
            &["C".to_string(), "A".to_string()]
        );
    }

    #[test]
    fn test_configuration_is_not_consumed() {
        let agg = aggregation(vec![(55.0, vec!["A"])]);
        let groups = vec![MatchGroup::new("Friends", "green", &["A"])];

        let first = classify(&agg, &groups);
        let second = classify(&agg, &groups);

        assert_eq!(groups[0].matches, vec!["A"]);
        assert_eq!(first, second);
    }
}
