use crate::domain::UserProfile;
use std::collections::HashSet;

const BASE_POINTS: f64 = 50.0;
const SHARED_INTEREST_POINTS: f64 = 40.0;
const SAME_COURSE_POINTS: f64 = 20.0;
const CLOSE_AGE_POINTS: f64 = 10.0;
const NEAR_AGE_POINTS: f64 = 5.0;

/// Deterministic local compatibility estimate, used whenever inference is
/// disabled, fails, or returns something unusable. Symmetric in its arguments.
pub fn heuristic_score(a: &UserProfile, b: &UserProfile) -> u8 {
    let interests_a: HashSet<&str> = a.interests.iter().map(String::as_str).collect();
    let interests_b: HashSet<&str> = b.interests.iter().map(String::as_str).collect();

    let shared = interests_a.intersection(&interests_b).count();
    let widest = interests_a.len().max(interests_b.len()).max(1);

    let mut score = BASE_POINTS + SHARED_INTEREST_POINTS * (shared as f64 / widest as f64);

    if same_course(a.course.as_deref(), b.course.as_deref()) {
        score += SAME_COURSE_POINTS;
    }

    let age_gap = (a.age - b.age).abs();
    if age_gap <= 2 {
        score += CLOSE_AGE_POINTS;
    } else if age_gap <= 5 {
        score += NEAR_AGE_POINTS;
    }

    score.clamp(0.0, 100.0).round() as u8
}

fn same_course(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
            a.to_lowercase() == b.to_lowercase()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    fn profile(interests: &[&str], course: Option<&str>, age: i32) -> UserProfile {
        UserProfile {
            name: "test".to_string(),
            age,
            gender: Gender::Other,
            course: course.map(str::to_string),
            branch: None,
            college: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            bio: None,
            photos: Vec::new(),
        }
    }

    #[test]
    fn test_reference_pair_clamps_to_hundred() {
        let a = profile(&["music", "hiking"], Some("CS"), 20);
        let b = profile(&["hiking", "art"], Some("CS"), 21);

        // 50 + 40 * 1/2 + 20 + 10 = 100
        assert_eq!(heuristic_score(&a, &b), 100);
    }

    #[test]
    fn test_course_match_ignores_case() {
        let a = profile(&[], Some("Computer Science"), 20);
        let b = profile(&[], Some("computer science"), 30);

        // 50 + 0 + 20 + 0
        assert_eq!(heuristic_score(&a, &b), 70);
    }

    #[test]
    fn test_missing_course_never_matches() {
        let a = profile(&[], None, 20);
        let b = profile(&[], None, 20);
        assert_eq!(heuristic_score(&a, &b), 60);

        let c = profile(&[], Some(""), 20);
        let d = profile(&[], Some(""), 20);
        assert_eq!(heuristic_score(&c, &d), 60);
    }

    #[test]
    fn test_age_bands() {
        let base = profile(&[], None, 20);
        assert_eq!(heuristic_score(&base, &profile(&[], None, 22)), 60);
        assert_eq!(heuristic_score(&base, &profile(&[], None, 25)), 55);
        assert_eq!(heuristic_score(&base, &profile(&[], None, 26)), 50);
    }

    #[test]
    fn test_shared_interest_ratio_rounds() {
        let a = profile(&["a", "b", "c"], None, 20);
        let b = profile(&["a"], None, 40);

        // 50 + 40 * 1/3 = 63.33
        assert_eq!(heuristic_score(&a, &b), 63);
    }

    #[test]
    fn test_duplicate_interests_count_once() {
        let a = profile(&["chess", "chess"], None, 40);
        let b = profile(&["chess"], None, 20);

        assert_eq!(heuristic_score(&a, &b), 90);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let samples = [
            profile(&[], None, 18),
            profile(&["music"], Some("Math"), 19),
            profile(&["music", "art", "film"], Some("math"), 23),
            profile(&["rowing", "art"], Some("Law"), 35),
            profile(&["a", "b", "c", "d", "e"], Some("Law"), 99),
        ];

        for a in &samples {
            for b in &samples {
                let ab = heuristic_score(a, b);
                assert_eq!(ab, heuristic_score(b, a));
                assert!(ab <= 100);
            }
        }
    }
}
