//! Routine order within a mesocycle

use crate::models::Routine;

/// Routines tagged with `mesocycle`, ordered by creation time.
///
/// Exact name match, no case folding. The sort is stable, so routines with
/// equal timestamps keep their input order. Routines whose `createdAt`
/// doesn't parse go last.
pub fn sequence<'a>(mesocycle: &str, routines: &'a [Routine]) -> Vec<&'a Routine> {
    let mut seq: Vec<&Routine> = routines
        .iter()
        .filter(|r| r.mesocycle == mesocycle)
        .collect();
    seq.sort_by_key(|r| {
        let created = r.created_at();
        (created.is_none(), created)
    });
    seq
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine(id: &str, mesocycle: &str, created_at: &str) -> Routine {
        Routine {
            id: id.to_string(),
            name: id.to_uppercase(),
            mesocycle: mesocycle.to_string(),
            exercises: vec![],
            created_at: created_at.to_string(),
        }
    }

    fn ids(seq: &[&Routine]) -> Vec<String> {
        seq.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_sorted_by_creation_time() {
        let routines = vec![
            routine("nine", "Hypertrophy", "2024-01-01T09:00:00Z"),
            routine("eight", "Hypertrophy", "2024-01-01T08:00:00Z"),
            routine("ten", "Hypertrophy", "2024-01-01T10:00:00Z"),
        ];
        assert_eq!(ids(&sequence("Hypertrophy", &routines)), vec!["eight", "nine", "ten"]);
    }

    #[test]
    fn test_filters_by_exact_name() {
        let routines = vec![
            routine("a", "Hypertrophy", "2024-01-01T08:00:00Z"),
            routine("b", "hypertrophy", "2024-01-01T09:00:00Z"),
            routine("c", "Strength", "2024-01-01T10:00:00Z"),
        ];
        assert_eq!(ids(&sequence("Hypertrophy", &routines)), vec!["a"]);
    }

    #[test]
    fn test_empty_when_nothing_matches() {
        let routines = vec![routine("a", "Strength", "2024-01-01T08:00:00Z")];
        assert!(sequence("Hypertrophy", &routines).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let routines = vec![
            routine("second", "Hypertrophy", "2024-01-01T08:00:00Z"),
            routine("first", "Hypertrophy", "2024-01-01T08:00:00Z"),
        ];
        assert_eq!(ids(&sequence("Hypertrophy", &routines)), vec!["second", "first"]);
    }

    #[test]
    fn test_offsets_compare_by_instant() {
        let routines = vec![
            // 07:00 UTC
            routine("late_local", "Hypertrophy", "2024-01-01T10:00:00+03:00"),
            routine("utc", "Hypertrophy", "2024-01-01T08:00:00Z"),
        ];
        assert_eq!(ids(&sequence("Hypertrophy", &routines)), vec!["late_local", "utc"]);
    }

    #[test]
    fn test_unparseable_created_at_goes_last() {
        let routines = vec![
            routine("broken", "Hypertrophy", "yesterday"),
            routine("ok", "Hypertrophy", "2024-01-01T08:00:00Z"),
        ];
        assert_eq!(ids(&sequence("Hypertrophy", &routines)), vec!["ok", "broken"]);
    }
}
