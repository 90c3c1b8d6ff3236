use rotor_protocol::Favorite;

/// Sort key remembered by the favorites store and reapplied after
/// every structural mutation, so a user's view ordering survives
/// add/remove and remote replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Id,
    Name,
    Angle,
}

/// Stable in-place sort by the given key.
pub fn sort(entries: &mut [Favorite], key: SortKey) {
    match key {
        SortKey::Id => entries.sort_by_key(|favorite| favorite.id),
        SortKey::Name => {
            entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        SortKey::Angle => entries.sort_by(|a, b| a.angle.total_cmp(&b.angle)),
    }
}

/// Reassign dense ids 1..=N in ascending old-id order. Sorts by the old
/// ids first, so identity stays stable no matter which display ordering
/// was active when an entry got removed.
pub fn renumber(entries: &mut [Favorite]) {
    entries.sort_by_key(|favorite| favorite.id);
    for (index, favorite) in entries.iter_mut().enumerate() {
        favorite.id = index as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(id: u32, name: &str, angle: f64) -> Favorite {
        Favorite { id, name: name.to_string(), angle }
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut entries = vec![
            favorite(1, "zulu", 10.0),
            favorite(2, "Alpha", 20.0),
            favorite(3, "mike", 30.0),
        ];
        sort(&mut entries, SortKey::Name);
        let names: Vec<&str> = entries.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "mike", "zulu"]);
    }

    #[test]
    fn angle_sort_is_numeric() {
        let mut entries = vec![
            favorite(1, "a", 300.0),
            favorite(2, "b", -45.0),
            favorite(3, "c", 12.5),
        ];
        sort(&mut entries, SortKey::Angle);
        let angles: Vec<f64> = entries.iter().map(|f| f.angle).collect();
        assert_eq!(angles, [-45.0, 12.5, 300.0]);
    }

    #[test]
    fn renumber_keeps_old_id_order_and_closes_gaps() {
        // Display order is by name here; ids have a gap after a remove.
        let mut entries = vec![
            favorite(3, "a", 0.0),
            favorite(1, "b", 0.0),
        ];
        renumber(&mut entries);
        assert_eq!(entries[0].name, "b");
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[1].name, "a");
        assert_eq!(entries[1].id, 2);
    }
}
